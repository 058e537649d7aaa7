//! # updraft-core
//!
//! Core library for the updraft self-update engine providing:
//! - Engine identity resolution (`EngineConfig`) from overrides, binary metadata and defaults
//! - Hierarchical runtime configuration (embedded defaults, user file, environment)
//! - Known-folder lookup used to classify where the executable runs from
//! - Shared error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    BinaryMetadata, EngineConfig, EngineOverrides, EnvironmentDefaults, RuntimeConfigLoader,
};
pub use error::{Error, Result};
pub use types::{KnownFolders, RuntimeConfig};
