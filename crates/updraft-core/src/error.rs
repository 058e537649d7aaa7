//! Error types for updraft-core

use thiserror::Error;

/// Result type alias using updraft-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration and environment errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration value or format
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A required identity field could not be resolved
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// GUID could not be parsed
    #[error("Invalid program GUID '{value}': {source}")]
    InvalidGuid {
        value: String,
        #[source]
        source: uuid::Error,
    },

    /// Update feed URI could not be parsed
    #[error("Invalid update feed URI '{value}': {source}")]
    InvalidUri {
        value: String,
        #[source]
        source: url::ParseError,
    },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid GUID error
    pub fn invalid_guid(value: impl Into<String>, source: uuid::Error) -> Self {
        Self::InvalidGuid {
            value: value.into(),
            source,
        }
    }

    /// Create an invalid URI error
    pub fn invalid_uri(value: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUri {
            value: value.into(),
            source,
        }
    }
}
