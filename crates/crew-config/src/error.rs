use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source failed to parse or a value has the wrong type.
    #[error("failed to load crew configuration: {0}")]
    Figment(#[from] figment::Error),

    /// `--config` named a file that does not exist.
    #[error("config file {} does not exist", path.display())]
    MissingFile { path: PathBuf },

    /// A section `serve` depends on has been left at its empty default.
    #[error("[{section}] is not configured")]
    NotConfigured { section: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}
