use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use gstr_core::JurisdictionTable;
use gstr_ingest::MappingRegistry;

use crate::state::{ensure_gstr_home, gstr_home};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub ingest: IngestSection,
    #[serde(default)]
    pub supplier: SupplierSection,
    #[serde(default)]
    pub jurisdiction: JurisdictionSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    /// Where `prepare` writes its CSVs unless `--out-dir` is given.
    pub dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("gstr-output"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestSection {
    /// Extra source mappings, merged over the built-in ones.
    pub mappings_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierSection {
    /// Used when a batch carries no supplier GSTIN at all.
    pub default_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionSection {
    /// Extra spellings: alias -> canonical state name.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl Config {
    pub fn jurisdiction_table(&self) -> Result<JurisdictionTable> {
        JurisdictionTable::standard()
            .with_aliases(&self.jurisdiction.aliases)
            .context("config [jurisdiction] aliases")
    }

    /// Built-in mappings, then the config file's, then `extra` (usually `--mappings`).
    pub fn mapping_registry(&self, extra: Option<&Path>) -> Result<MappingRegistry> {
        let mut registry = MappingRegistry::builtin().context("built-in source mappings")?;
        for path in self.ingest.mappings_file.as_deref().into_iter().chain(extra) {
            registry.extend(MappingRegistry::load(path)?);
        }
        Ok(registry)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(gstr_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<PathBuf> {
    let p = ensure_gstr_home()?.join("config.toml");
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(p)
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let written = save_config(&Config::default())?;
    println!("Wrote {}", written.display());
    Ok(())
}
