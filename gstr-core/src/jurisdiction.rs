//! Jurisdiction table: canonical states/territories and the alias list used to
//! clean up free-text place-of-supply values.
//!
//! The table is plain data. Build it once (`JurisdictionTable::standard()`),
//! optionally extend its aliases from configuration, and pass it by reference
//! to whatever needs it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// (two-digit code, canonical name)
const STATES: &[(&str, &str)] = &[
    ("35", "Andaman and Nicobar Islands"),
    ("37", "Andhra Pradesh"),
    ("12", "Arunachal Pradesh"),
    ("18", "Assam"),
    ("10", "Bihar"),
    ("04", "Chandigarh"),
    ("22", "Chhattisgarh"),
    ("26", "Dadra and Nagar Haveli and Daman and Diu"),
    ("25", "Daman and Diu"),
    ("07", "Delhi"),
    ("30", "Goa"),
    ("24", "Gujarat"),
    ("06", "Haryana"),
    ("02", "Himachal Pradesh"),
    ("01", "Jammu and Kashmir"),
    ("20", "Jharkhand"),
    ("29", "Karnataka"),
    ("32", "Kerala"),
    ("38", "Ladakh"),
    ("31", "Lakshadweep"),
    ("23", "Madhya Pradesh"),
    ("27", "Maharashtra"),
    ("14", "Manipur"),
    ("17", "Meghalaya"),
    ("15", "Mizoram"),
    ("13", "Nagaland"),
    ("21", "Odisha"),
    ("97", "Other Territory"),
    ("34", "Puducherry"),
    ("03", "Punjab"),
    ("08", "Rajasthan"),
    ("11", "Sikkim"),
    ("33", "Tamil Nadu"),
    ("36", "Telangana"),
    ("16", "Tripura"),
    ("09", "Uttar Pradesh"),
    ("05", "Uttarakhand"),
    ("19", "West Bengal"),
];

/// (alias, canonical name). Matched case-insensitively.
pub(crate) const ALIASES: &[(&str, &str)] = &[
    ("AP", "Andhra Pradesh"),
    ("AN", "Andaman and Nicobar Islands"),
    ("AR", "Arunachal Pradesh"),
    ("AS", "Assam"),
    ("BR", "Bihar"),
    ("CG", "Chhattisgarh"),
    ("Chattisgarh", "Chhattisgarh"),
    ("CH", "Chandigarh"),
    ("DN", "Dadra and Nagar Haveli and Daman and Diu"),
    ("DD", "Dadra and Nagar Haveli and Daman and Diu"),
    ("DL", "Delhi"),
    ("GA", "Goa"),
    ("GJ", "Gujarat"),
    ("HR", "Haryana"),
    ("HP", "Himachal Pradesh"),
    ("JK", "Jammu and Kashmir"),
    ("Jammu & Kashmir", "Jammu and Kashmir"),
    ("JH", "Jharkhand"),
    ("KA", "Karnataka"),
    ("KL", "Kerala"),
    ("LA", "Ladakh"),
    ("LD", "Lakshadweep"),
    ("MP", "Madhya Pradesh"),
    ("MH", "Maharashtra"),
    ("MN", "Manipur"),
    ("ML", "Meghalaya"),
    ("MZ", "Mizoram"),
    ("NL", "Nagaland"),
    ("OD", "Odisha"),
    ("OR", "Odisha"),
    ("Orisha", "Odisha"),
    ("Oddisha", "Odisha"),
    ("Orrisha", "Odisha"),
    ("PY", "Puducherry"),
    ("Pondicherry", "Puducherry"),
    ("PB", "Punjab"),
    ("RJ", "Rajasthan"),
    ("SK", "Sikkim"),
    ("TN", "Tamil Nadu"),
    ("TS", "Telangana"),
    ("TR", "Tripura"),
    ("UP", "Uttar Pradesh"),
    ("UK", "Uttarakhand"),
    ("UA", "Uttarakhand"),
    ("UT", "Uttarakhand"),
    ("WB", "West Bengal"),
    ("The Andaman and Nicobar Islands", "Andaman and Nicobar Islands"),
    ("Andaman & Nicobar Islands", "Andaman and Nicobar Islands"),
    ("The Andaman & Nicobar Islands", "Andaman and Nicobar Islands"),
];

/// Canonical `"NN-Name"` jurisdiction code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StateCode(String);

impl StateCode {
    /// Validate the `"NN-Name"` shape. Does not check table membership.
    pub fn parse(value: impl Into<String>) -> Result<Self, TableError> {
        let value = value.into();
        let bytes = value.as_bytes();
        let well_formed = bytes.len() > 3
            && bytes[0].is_ascii_digit()
            && bytes[1].is_ascii_digit()
            && bytes[2] == b'-'
            && !value[3..].trim().is_empty();
        if !well_formed {
            return Err(TableError::InvalidStateCode(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The two-digit prefix.
    pub fn number(&self) -> &str {
        &self.0[..2]
    }
}

impl<'de> Deserialize<'de> for StateCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for StateCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub name: String,
    pub number: String,
    pub code: StateCode,
}

#[derive(Debug, Clone)]
pub struct JurisdictionTable {
    states: Vec<StateEntry>,
    by_number: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    by_code: HashMap<String, usize>,
    aliases: HashMap<String, usize>,
}

impl JurisdictionTable {
    /// The built-in table of states, territories and known aliases.
    pub fn standard() -> Self {
        let states = STATES
            .iter()
            .map(|(number, name)| StateEntry {
                name: name.to_string(),
                number: number.to_string(),
                code: StateCode(format!("{number}-{name}")),
            })
            .collect();
        let table = Self::index(states);
        // Built-in aliases are checked by `test_builtin_aliases_resolve`.
        let aliases = ALIASES
            .iter()
            .filter_map(|(alias, target)| {
                table
                    .by_name
                    .get(&target.to_lowercase())
                    .map(|idx| (alias.to_lowercase(), *idx))
            })
            .collect();
        Self { aliases, ..table }
    }

    fn index(states: Vec<StateEntry>) -> Self {
        let mut by_number = HashMap::new();
        let mut by_name = HashMap::new();
        let mut by_code = HashMap::new();
        for (idx, entry) in states.iter().enumerate() {
            by_number.insert(entry.number.clone(), idx);
            by_name.insert(entry.name.to_lowercase(), idx);
            by_code.insert(entry.code.as_str().to_string(), idx);
        }
        Self {
            states,
            by_number,
            by_name,
            by_code,
            aliases: HashMap::new(),
        }
    }

    /// Add aliases (alias -> canonical name). Every target must name a state
    /// in the table; later entries replace earlier ones with the same key.
    pub fn with_aliases<I, A, T>(mut self, aliases: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (A, T)>,
        A: AsRef<str>,
        T: AsRef<str>,
    {
        for (alias, target) in aliases {
            let alias = alias.as_ref().trim();
            if alias.is_empty() {
                return Err(TableError::BlankAlias);
            }
            let idx = self
                .by_name
                .get(&target.as_ref().trim().to_lowercase())
                .copied()
                .ok_or_else(|| TableError::UnknownAliasTarget {
                    alias: alias.to_string(),
                    target: target.as_ref().to_string(),
                })?;
            self.aliases.insert(alias.to_lowercase(), idx);
        }
        Ok(self)
    }

    pub fn states(&self) -> &[StateEntry] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Look up by two-digit code, e.g. `"29"`.
    pub fn by_number(&self, number: &str) -> Option<&StateEntry> {
        self.by_number.get(number).map(|idx| &self.states[*idx])
    }

    /// Look up by canonical name, ignoring case.
    pub fn by_name(&self, name: &str) -> Option<&StateEntry> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|idx| &self.states[*idx])
    }

    /// Exact match against a canonical `"NN-Name"` code.
    pub fn by_code(&self, code: &str) -> Option<&StateEntry> {
        self.by_code.get(code).map(|idx| &self.states[*idx])
    }

    pub fn by_alias(&self, alias: &str) -> Option<&StateEntry> {
        self.aliases
            .get(&alias.to_lowercase())
            .map(|idx| &self.states[*idx])
    }

    /// State encoded in the first two characters of a GSTIN-style identifier.
    pub fn by_identifier_prefix(&self, identifier: &str) -> Option<&StateEntry> {
        identifier
            .trim()
            .get(..2)
            .and_then(|prefix| self.by_number(prefix))
    }
}

impl Default for JurisdictionTable {
    fn default() -> Self {
        Self::standard()
    }
}
