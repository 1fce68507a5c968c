//! Source mappings: which raw column heading feeds which canonical field.
//!
//! Mappings are data, loaded from TOML and validated up front so a bad mapping
//! fails before any file is read.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::CanonicalField;

const BUILTIN_SOURCES: &str = include_str!("../sources.toml");

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("source mapping with a blank name")]
    BlankName,

    #[error("source {0:?} maps no columns")]
    Empty(String),

    #[error("source {0:?} has a blank column heading")]
    BlankHeading(String),

    #[error("source {source_name:?} maps more than one column to {field:?}")]
    DuplicateTarget {
        source_name: String,
        field: CanonicalField,
    },

    #[error("source {0:?} is defined twice")]
    DuplicateSource(String),

    #[error("parsing source mappings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Mapping for one upstream export format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMapping {
    pub name: String,

    /// Raw heading -> canonical field.
    #[serde(default)]
    pub columns: BTreeMap<String, CanonicalField>,

    /// A column holding either the recipient GSTIN or, for consumer sales,
    /// the place of supply.
    #[serde(default)]
    pub identifier_or_place: Option<String>,
}

impl SourceMapping {
    pub fn validate(&self) -> Result<(), MappingError> {
        if self.name.trim().is_empty() {
            return Err(MappingError::BlankName);
        }
        if self.columns.is_empty() && self.identifier_or_place.is_none() {
            return Err(MappingError::Empty(self.name.clone()));
        }
        let blank_split = self
            .identifier_or_place
            .as_deref()
            .is_some_and(|h| h.trim().is_empty());
        if blank_split || self.columns.keys().any(|h| h.trim().is_empty()) {
            return Err(MappingError::BlankHeading(self.name.clone()));
        }

        let mut seen = HashSet::new();
        if self.identifier_or_place.is_some() {
            seen.insert(CanonicalField::RecipientId);
            seen.insert(CanonicalField::PlaceOfSupply);
        }
        for field in self.columns.values() {
            if !seen.insert(*field) {
                return Err(MappingError::DuplicateTarget {
                    source_name: self.name.clone(),
                    field: *field,
                });
            }
        }
        Ok(())
    }

    /// Every raw heading this mapping reads.
    pub fn headings(&self) -> impl Iterator<Item = &str> {
        self.columns
            .keys()
            .map(String::as_str)
            .chain(self.identifier_or_place.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct MappingFile {
    #[serde(default, rename = "source")]
    sources: Vec<SourceMapping>,
}

#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    sources: BTreeMap<String, SourceMapping>,
}

impl MappingRegistry {
    /// Mappings for the export formats we know about.
    pub fn builtin() -> Result<Self, MappingError> {
        Self::from_toml_str(BUILTIN_SOURCES)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, MappingError> {
        let file: MappingFile = toml::from_str(s)?;
        let mut sources = BTreeMap::new();
        for mapping in file.sources {
            mapping.validate()?;
            if sources.contains_key(&mapping.name) {
                return Err(MappingError::DuplicateSource(mapping.name));
            }
            sources.insert(mapping.name.clone(), mapping);
        }
        Ok(Self { sources })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("load mappings from {}", path.display()))
    }

    /// Add mappings from `other`; same-named sources are replaced.
    pub fn extend(&mut self, other: MappingRegistry) {
        self.sources.extend(other.sources);
    }

    pub fn get(&self, name: &str) -> Option<&SourceMapping> {
        self.sources.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
