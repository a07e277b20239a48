use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One roster row as supplied by the caller. Never mutated by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub family_name: String,
    pub given_name: String,
    pub id: String,
    pub address: Option<String>,
    #[serde(default)]
    pub extra_fields: HashMap<String, String>, // Columns beyond the required four, passed through
}

impl RawRecord {
    pub fn new(family_name: &str, given_name: &str, id: &str, address: Option<&str>) -> Self {
        Self {
            family_name: family_name.to_string(),
            given_name: given_name.to_string(),
            id: id.to_string(),
            address: address.map(|s| s.to_string()),
            extra_fields: HashMap::new(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.family_name, self.given_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedAddress {
    pub street_raw: String,
    pub house_number: u64,
    pub street_canonical: String,
}

/// A street spelling the detective believes should be rewritten to `canonical_suggestion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePair {
    #[serde(rename = "Original")]
    pub variant: String,
    #[serde(rename = "Corregido")]
    pub canonical_suggestion: String,
}

// Column mapping for roster files; maps the source header names to the fields the core needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub family_name: String,
    pub given_name: String,
    pub id: String,
    pub address: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            family_name: "Apellido".into(),
            given_name: "Nombre".into(),
            id: "Matricula".into(),
            address: "Domicilio".into(),
        }
    }
}

impl ColumnMapping {
    pub fn required(&self) -> [&str; 4] {
        [
            self.family_name.as_str(),
            self.given_name.as_str(),
            self.id.as_str(),
            self.address.as_str(),
        ]
    }

    pub fn is_required(&self, header: &str) -> bool {
        self.required().contains(&header)
    }
}
