use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ingest::Delimiter;
use crate::matching::DetectiveConfig;
use crate::models::ColumnMapping;
use crate::normalize::ReplaceScope;

pub const DEFAULT_ROSTER_PATH: &str = "datos.csv";
pub const DEFAULT_OVERRIDES_PATH: &str = "correcciones.csv";
pub const DEFAULT_SUGGESTIONS_PATH: &str = "correcciones_sugeridas.csv";

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct RosterConfig {
    pub path: PathBuf,
    pub delimiter: Delimiter,
    #[serde(default)]
    pub columns: ColumnMapping,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_ROSTER_PATH),
            delimiter: Delimiter::Auto,
            columns: ColumnMapping::default(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct OverrideConfig {
    pub path: PathBuf,
    pub delimiter: Delimiter,
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OVERRIDES_PATH),
            delimiter: Delimiter::Auto,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct NormalizerConfig {
    pub replace_scope: ReplaceScope,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ExportConfig {
    pub suggestions_path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            suggestions_path: PathBuf::from(DEFAULT_SUGGESTIONS_PATH),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub overrides: OverrideConfig,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub detective: DetectiveConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roster.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "roster.path",
            });
        }
        if self.overrides.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "overrides.path",
            });
        }

        let cols = &self.roster.columns;
        let named = [
            ("roster.columns.family_name", &cols.family_name),
            ("roster.columns.given_name", &cols.given_name),
            ("roster.columns.id", &cols.id),
            ("roster.columns.address", &cols.address),
        ];
        let mut seen = HashSet::new();
        for (field, name) in named {
            if name.trim().is_empty() {
                return Err(ConfigError::MissingField { field });
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("column {:?} is mapped twice", name),
                });
            }
        }

        let t = self.detective.threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "detective.threshold",
                reason: format!("{} not in (0, 1]", t),
            });
        }
        if self.detective.min_variant_len == 0 {
            return Err(ConfigError::InvalidValue {
                field: "detective.min_variant_len",
                reason: "must be > 0".into(),
            });
        }
        Ok(())
    }
}
