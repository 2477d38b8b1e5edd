//! Error types for deploykey-core

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] deploykey_config::ConfigError),

    #[error("Failed to decode SSH key from ${env}: {reason}")]
    KeyDecode { env: String, reason: String },

    #[error("Failed to create SSH directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
