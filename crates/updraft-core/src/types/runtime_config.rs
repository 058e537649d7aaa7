//! Runtime configuration types for operational parameters
//!
//! These types define configuration that controls how the engine talks to
//! the release feed, how downloads are chunked and how long the applier
//! waits for running instances to exit.

use serde::{Deserialize, Serialize};

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Release selection policy
    #[serde(default)]
    pub update: UpdatePolicyConfig,

    /// Update application settings
    #[serde(default)]
    pub applier: ApplierConfig,
}

/// Network and HTTP configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Timeout for release feed requests in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Timeout for a whole asset download in seconds
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Download chunk size in bytes
    #[serde(default = "default_chunk_size")]
    pub download_chunk_size: usize,

    /// User agent string for asset downloads
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            download_timeout_secs: default_download_timeout(),
            download_chunk_size: default_chunk_size(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout() -> u64 {
    30
}
fn default_download_timeout() -> u64 {
    600 // 10 minutes
}
fn default_chunk_size() -> usize {
    256 * 1024
}
fn default_user_agent() -> String {
    format!(
        "updraft/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Which releases of the feed are eligible
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdatePolicyConfig {
    /// Accept releases flagged as prerelease
    #[serde(default)]
    pub allow_prerelease: bool,

    /// Release tags that are never selected (case-insensitive)
    #[serde(default)]
    pub ignore_tags: Vec<String>,

    /// Overrides the release feed resolved from the engine identity
    #[serde(default)]
    pub feed_uri: Option<String>,
}

/// Update application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApplierConfig {
    /// How long to wait for each running instance to exit, in milliseconds
    #[serde(default = "default_exit_wait_timeout")]
    pub exit_wait_timeout_ms: u64,

    /// Start the destination again once it has been replaced
    #[serde(default = "default_relaunch")]
    pub relaunch: bool,
}

impl Default for ApplierConfig {
    fn default() -> Self {
        Self {
            exit_wait_timeout_ms: default_exit_wait_timeout(),
            relaunch: default_relaunch(),
        }
    }
}

fn default_exit_wait_timeout() -> u64 {
    2000
}
fn default_relaunch() -> bool {
    true
}
