pub mod address;
pub mod cli;
pub mod config;
pub mod export;
pub mod index;
pub mod ingest;
pub mod logging;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod util;

pub mod error;
