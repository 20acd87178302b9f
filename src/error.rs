use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] diesel::result::Error),

    #[error("Catalog connection error: {0}")]
    CatalogConnection(#[from] diesel::ConnectionError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Catalog migration error: {0}")]
    Migration(String),

    #[error("Remote mirror is not reachable at {}", .0.display())]
    MirrorUnavailable(PathBuf),

    #[error("Quarantine error: {0}")]
    Quarantine(String),

    #[error("Cannot resolve shortcut {}: {reason}", .path.display())]
    Shortcut { path: PathBuf, reason: String },

    #[error("{0}")]
    Other(String),
}
