//! Error types for the papermap core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering data loading, filter parsing, configuration, and storage.

use std::path::PathBuf;

/// Top-level error type for the papermap core library.
#[derive(Debug, thiserror::Error)]
pub enum PapermapError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from fetching and decoding the static JSON inputs.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to fetch {resource}: {message}")]
    Fetch { resource: String, message: String },

    #[error("Fetching {resource} returned HTTP {status}")]
    Status { resource: String, status: u16 },

    #[error("Failed to decode {resource}: {message}")]
    Decode { resource: String, message: String },

    #[error("Invalid data source: {message}")]
    InvalidSource { message: String },
}

/// Errors from building filter state out of user input.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("Unknown filter dimension: {name}")]
    UnknownDimension { name: String },

    #[error("Invalid page query: {message}")]
    InvalidQuery { message: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `PapermapError`.
pub type Result<T> = std::result::Result<T, PapermapError>;
