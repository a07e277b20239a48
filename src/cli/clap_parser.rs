use std::path::PathBuf;

use crate::config::{
    AppConfig, DEFAULT_OVERRIDES_PATH, DEFAULT_ROSTER_PATH, DEFAULT_SUGGESTIONS_PATH,
    ExportConfig, NormalizerConfig, OverrideConfig, RosterConfig,
};
use crate::error::ConfigError;
use crate::ingest::Delimiter;
use crate::matching::DetectiveConfig;
use crate::matching::similarity::ScorerKind;
use crate::models::ColumnMapping;
use crate::normalize::ReplaceScope;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, ValueEnum, Debug)]
pub enum DelimiterOpt {
    Auto,
    Comma,
    Semicolon,
}

impl From<DelimiterOpt> for Delimiter {
    fn from(opt: DelimiterOpt) -> Self {
        match opt {
            DelimiterOpt::Auto => Delimiter::Auto,
            DelimiterOpt::Comma => Delimiter::Comma,
            DelimiterOpt::Semicolon => Delimiter::Semicolon,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, ValueEnum, Debug)]
pub enum ScopeOpt {
    /// Strip every occurrence of a matching prefix
    All,
    /// Strip only the leading occurrence
    Leading,
}

impl From<ScopeOpt> for ReplaceScope {
    fn from(opt: ScopeOpt) -> Self {
        match opt {
            ScopeOpt::All => ReplaceScope::AllOccurrences,
            ScopeOpt::Leading => ReplaceScope::LeadingOnly,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, ValueEnum, Debug)]
pub enum ScorerOpt {
    Sequence,
    Levenshtein,
    JaroWinkler,
}

impl From<ScorerOpt> for ScorerKind {
    fn from(opt: ScorerOpt) -> Self {
        match opt {
            ScorerOpt::Sequence => ScorerKind::Sequence,
            ScorerOpt::Levenshtein => ScorerKind::Levenshtein,
            ScorerOpt::JaroWinkler => ScorerKind::JaroWinkler,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "neighbor_finder",
    version,
    about = "Find neighbors on the same street in a member roster (CLI)",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Roster CSV (env: NEIGHBOR_ROSTER)
    #[arg(long, global = true, value_name = "PATH", env = "NEIGHBOR_ROSTER", default_value = DEFAULT_ROSTER_PATH)]
    pub roster: PathBuf,
    /// Reviewed street corrections CSV (env: NEIGHBOR_OVERRIDES)
    #[arg(long, global = true, value_name = "PATH", env = "NEIGHBOR_OVERRIDES", default_value = DEFAULT_OVERRIDES_PATH)]
    pub overrides: PathBuf,
    /// Field delimiter of the roster (env: NEIGHBOR_DELIMITER)
    #[arg(long, global = true, env = "NEIGHBOR_DELIMITER", default_value_t = DelimiterOpt::Auto, value_enum)]
    pub delimiter: DelimiterOpt,
    /// Field delimiter of the corrections file; `detect` writes commas (env: NEIGHBOR_OVERRIDES_DELIMITER)
    #[arg(long = "overrides-delimiter", global = true, env = "NEIGHBOR_OVERRIDES_DELIMITER", default_value_t = DelimiterOpt::Auto, value_enum)]
    pub overrides_delimiter: DelimiterOpt,
    /// How generic prefix rules strip text (env: NEIGHBOR_REPLACE_SCOPE)
    #[arg(long = "replace-scope", global = true, env = "NEIGHBOR_REPLACE_SCOPE", default_value_t = ScopeOpt::All, value_enum)]
    pub replace_scope: ScopeOpt,
    /// Family-name column (env: NEIGHBOR_COL_FAMILY)
    #[arg(long = "col-family", global = true, env = "NEIGHBOR_COL_FAMILY", default_value = "Apellido")]
    pub col_family: String,
    /// Given-name column (env: NEIGHBOR_COL_GIVEN)
    #[arg(long = "col-given", global = true, env = "NEIGHBOR_COL_GIVEN", default_value = "Nombre")]
    pub col_given: String,
    /// Identifier column (env: NEIGHBOR_COL_ID)
    #[arg(long = "col-id", global = true, env = "NEIGHBOR_COL_ID", default_value = "Matricula")]
    pub col_id: String,
    /// Address column (env: NEIGHBOR_COL_ADDRESS)
    #[arg(long = "col-address", global = true, env = "NEIGHBOR_COL_ADDRESS", default_value = "Domicilio")]
    pub col_address: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// People on the same street as PERSON, within RADIUS house numbers
    Near {
        #[arg(long, value_name = "ID")]
        person: String,
        #[arg(long, default_value_t = 500)]
        radius: u64,
    },
    /// Everyone on a street, optionally around a house number
    Street {
        name: String,
        /// Center house number; 0 lists the whole street
        #[arg(long, default_value_t = 0)]
        number: u64,
        #[arg(long)]
        radius: Option<u64>,
    },
    /// List canonical streets
    Streets,
    /// Raw spellings that normalize to a canonical street
    Variants { name: String },
    /// Search people by family name or identifier
    Search { query: String },
    /// Write the roster with normalized street and house number columns
    Export {
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
    },
    /// Suggest street corrections by grouping similar spellings
    Detect {
        #[arg(long, value_name = "PATH", env = "NEIGHBOR_SUGGESTIONS", default_value = DEFAULT_SUGGESTIONS_PATH)]
        out: PathBuf,
        #[arg(long, default_value_t = 0.85)]
        threshold: f64,
        #[arg(long, default_value_t = ScorerOpt::Sequence, value_enum)]
        scorer: ScorerOpt,
        /// Ignore spellings shorter than this
        #[arg(long = "min-len", default_value_t = 4)]
        min_len: usize,
        /// Also group when one spelling contains another longer than N chars
        #[arg(long, value_name = "N")]
        containment: Option<usize>,
        /// Score on a single thread
        #[arg(long)]
        sequential: bool,
    },
    /// Write a .env template
    EnvTemplate {
        #[arg(default_value = ".env.template")]
        path: PathBuf,
    },
}

impl Cli {
    pub fn to_app_config(&self) -> Result<AppConfig, ConfigError> {
        let mut cfg = AppConfig {
            roster: RosterConfig {
                path: self.roster.clone(),
                delimiter: self.delimiter.into(),
                columns: ColumnMapping {
                    family_name: self.col_family.clone(),
                    given_name: self.col_given.clone(),
                    id: self.col_id.clone(),
                    address: self.col_address.clone(),
                },
            },
            overrides: OverrideConfig {
                path: self.overrides.clone(),
                delimiter: self.overrides_delimiter.into(),
            },
            normalizer: NormalizerConfig {
                replace_scope: self.replace_scope.into(),
            },
            detective: DetectiveConfig::default(),
            export: ExportConfig::default(),
        };
        if let Command::Detect {
            out,
            threshold,
            scorer,
            min_len,
            containment,
            sequential,
        } = &self.command
        {
            cfg.detective = DetectiveConfig {
                threshold: *threshold,
                min_variant_len: *min_len,
                containment_min_len: *containment,
                scorer: (*scorer).into(),
                parallel: !*sequential,
            };
            cfg.export.suggestions_path = out.clone();
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
