//! CLI module: clap-based argument parsing mapped onto [`crate::config::AppConfig`].

mod clap_parser;

pub use clap_parser::{Cli, Command, DelimiterOpt, ScopeOpt, ScorerOpt};
