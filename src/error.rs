use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file not found: {path} (expected a CSV file at this location)")]
    NotFound { path: String },
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: could not split the header into columns with ',' or ';'")]
    Delimiter { path: String },
    #[error("{path}: missing required columns: {}", missing.join(", "))]
    MissingColumns { path: String, missing: Vec<String> },
    #[error("{path}: csv error: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),
}
