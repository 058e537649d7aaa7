//! Configuration loading and identity resolution

mod engine_config;
mod runtime_loader;

pub use engine_config::{
    strip_suffix_ignore_ascii_case, BinaryMetadata, EngineConfig, EngineOverrides,
    EnvironmentDefaults, DEFAULT_SETUP_ARGUMENT, DEFAULT_UPDATE_SUFFIX,
};
pub use runtime_loader::RuntimeConfigLoader;
