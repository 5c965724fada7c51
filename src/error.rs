use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Per-file failures. The run controller logs these and moves on to the next file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("missing required column '{column}' in {table}")]
    MissingColumn { column: &'static str, table: String },
    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export error: {0}")]
    Csv(String),
    #[error("xlsx export error: {0}")]
    Xlsx(String),
    #[error("output io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to list {}: {source}", dir.display())]
    Discover {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create output folder {}: {source}", dir.display())]
    OutputDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to save results: {0}")]
    Save(#[from] ExportError),
    #[error("no pending results to save")]
    NothingToSave,
}
