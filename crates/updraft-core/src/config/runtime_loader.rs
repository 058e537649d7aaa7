//! Hierarchical runtime configuration loader
//!
//! Loads runtime configuration from multiple sources with the following
//! precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. User runtime config (~/.updraft/updraft-runtime.yaml)
//! 3. Environment variables (UPDRAFT_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::RuntimeConfig;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::str::FromStr;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/embedded/"]
#[prefix = ""]
struct EmbeddedConfigs;

const RUNTIME_DEFAULTS: &str = "runtime-defaults.yaml";
const RUNTIME_FILE: &str = "updraft-runtime.yaml";

/// Runtime configuration loader
pub struct RuntimeConfigLoader {
    /// Directory holding the user's runtime config file
    config_dir: Utf8PathBuf,

    /// Runtime config file, `config_dir/updraft-runtime.yaml` unless overridden
    runtime_file: Utf8PathBuf,
}

impl RuntimeConfigLoader {
    /// Create a loader rooted at the standard config directory (~/.updraft)
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self::with_dir(config_dir))
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        let runtime_file = config_dir.join(RUNTIME_FILE);
        Self {
            config_dir,
            runtime_file,
        }
    }

    /// Read the user layer from `path` instead of the config directory
    pub fn with_file(mut self, path: Utf8PathBuf) -> Self {
        self.runtime_file = path;
        self
    }

    fn get_config_dir() -> Result<Utf8PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|p| Error::invalid_config(format!("Home directory is not UTF-8: {:?}", p)))?;

        Ok(home.join(".updraft"))
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load(&self) -> Result<RuntimeConfig> {
        let mut config = Self::load_embedded_config::<RuntimeConfig>(RUNTIME_DEFAULTS)?;

        if self.runtime_file.exists() {
            debug!("Loading runtime config from {}", self.runtime_file);
            let file_config = self.load_yaml_file::<RuntimeConfig>(&self.runtime_file)?;
            config = Self::merge_runtime_config(config, file_config);
        }

        Self::apply_env_overrides(config)
    }

    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })
    }

    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Merge two runtime configs (base is overridden by overlay)
    fn merge_runtime_config(base: RuntimeConfig, overlay: RuntimeConfig) -> RuntimeConfig {
        let mut update = overlay.update;
        if update.feed_uri.is_none() {
            update.feed_uri = base.update.feed_uri;
        }
        if update.ignore_tags.is_empty() {
            update.ignore_tags = base.update.ignore_tags;
        }

        RuntimeConfig {
            network: overlay.network,
            update,
            applier: overlay.applier,
        }
    }

    fn apply_env_overrides(mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Some(val) = env_number("UPDRAFT_HTTP_TIMEOUT_SECS")? {
            config.network.http_timeout_secs = val;
        }

        if let Some(val) = env_number("UPDRAFT_DOWNLOAD_TIMEOUT_SECS")? {
            config.network.download_timeout_secs = val;
        }

        if let Some(val) = env_number::<usize>("UPDRAFT_DOWNLOAD_CHUNK_SIZE")? {
            if val == 0 {
                return Err(Error::invalid_config(
                    "UPDRAFT_DOWNLOAD_CHUNK_SIZE must be greater than zero",
                ));
            }
            config.network.download_chunk_size = val;
        }

        if let Some(val) = env_bool("UPDRAFT_ALLOW_PRERELEASE")? {
            config.update.allow_prerelease = val;
        }

        if let Ok(val) = env::var("UPDRAFT_IGNORE_TAGS") {
            config.update.ignore_tags = val
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
        }

        if let Ok(val) = env::var("UPDRAFT_FEED_URI") {
            config.update.feed_uri = Some(val).filter(|v| !v.is_empty());
        }

        if let Some(val) = env_number("UPDRAFT_EXIT_WAIT_TIMEOUT_MS")? {
            config.applier.exit_wait_timeout_ms = val;
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}

fn env_number<T: FromStr>(name: &str) -> Result<Option<T>> {
    env_value(name, "a valid number")
}

fn env_bool(name: &str) -> Result<Option<bool>> {
    env_value(name, "true or false")
}

fn env_value<T: FromStr>(name: &str, expected: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid_config(format!("{} must be {}", name, expected))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn create_temp_loader() -> (RuntimeConfigLoader, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_dir =
            Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).expect("Invalid UTF-8 path");
        let loader = RuntimeConfigLoader::with_dir(config_dir);
        (loader, temp_dir)
    }

    #[test]
    #[serial]
    fn test_load_defaults() {
        let (loader, _temp) = create_temp_loader();
        let config = loader.load().unwrap();
        assert_eq!(config.network.http_timeout_secs, 30);
        assert_eq!(config.network.download_chunk_size, 262_144);
        assert_eq!(config.applier.exit_wait_timeout_ms, 2000);
        assert!(config.applier.relaunch);
        assert!(config.update.feed_uri.is_none());
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let (loader, _temp) = create_temp_loader();

        let config_content = r#"
network:
  http-timeout-secs: 5
update:
  allow-prerelease: true
  feed-uri: "https://example.com/releases"
applier:
  relaunch: false
"#;
        fs::write(loader.config_dir().join(RUNTIME_FILE), config_content).unwrap();

        let config = loader.load().unwrap();
        assert_eq!(config.network.http_timeout_secs, 5);
        assert_eq!(config.network.download_timeout_secs, 600);
        assert!(config.update.allow_prerelease);
        assert_eq!(
            config.update.feed_uri.as_deref(),
            Some("https://example.com/releases")
        );
        assert!(!config.applier.relaunch);
    }

    #[test]
    #[serial]
    fn test_explicit_file_replaces_user_layer() {
        let (loader, temp) = create_temp_loader();
        fs::write(
            loader.config_dir().join(RUNTIME_FILE),
            "network:\n  http-timeout-secs: 5\n",
        )
        .unwrap();
        let custom = temp.path().join("custom.yaml");
        fs::write(&custom, "network:\n  http-timeout-secs: 9\n").unwrap();

        let loader = loader.with_file(Utf8PathBuf::from_path_buf(custom).unwrap());
        let config = loader.load().unwrap();
        assert_eq!(config.network.http_timeout_secs, 9);
    }

    #[test]
    #[serial]
    fn test_invalid_file_is_reported() {
        let (loader, _temp) = create_temp_loader();
        fs::write(loader.config_dir().join(RUNTIME_FILE), "network: [").unwrap();

        let err = loader.load().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        let (loader, _temp) = create_temp_loader();

        env::set_var("UPDRAFT_HTTP_TIMEOUT_SECS", "12");
        env::set_var("UPDRAFT_IGNORE_TAGS", "v2.0.0, v2.0.1,");
        env::set_var("UPDRAFT_ALLOW_PRERELEASE", "true");
        env::set_var("UPDRAFT_EXIT_WAIT_TIMEOUT_MS", "50");

        let config = loader.load().unwrap();
        assert_eq!(config.network.http_timeout_secs, 12);
        assert_eq!(
            config.update.ignore_tags,
            vec!["v2.0.0".to_string(), "v2.0.1".to_string()]
        );
        assert!(config.update.allow_prerelease);
        assert_eq!(config.applier.exit_wait_timeout_ms, 50);

        env::remove_var("UPDRAFT_HTTP_TIMEOUT_SECS");
        env::remove_var("UPDRAFT_IGNORE_TAGS");
        env::remove_var("UPDRAFT_ALLOW_PRERELEASE");
        env::remove_var("UPDRAFT_EXIT_WAIT_TIMEOUT_MS");
    }

    #[test]
    #[serial]
    fn test_invalid_env_number() {
        let (loader, _temp) = create_temp_loader();

        env::set_var("UPDRAFT_DOWNLOAD_CHUNK_SIZE", "lots");
        let result = loader.load();
        env::remove_var("UPDRAFT_DOWNLOAD_CHUNK_SIZE");

        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    #[serial]
    fn test_invalid_env_bool() {
        let (loader, _temp) = create_temp_loader();

        env::set_var("UPDRAFT_ALLOW_PRERELEASE", "yes");
        let result = loader.load();
        env::remove_var("UPDRAFT_ALLOW_PRERELEASE");

        match result {
            Err(Error::InvalidConfig { message }) => {
                assert!(message.contains("UPDRAFT_ALLOW_PRERELEASE"))
            }
            other => panic!("expected invalid config, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_keeps_base_feed() {
        let mut base = RuntimeConfig::default();
        base.update.feed_uri = Some("https://base.example/releases".to_string());
        let mut overlay = RuntimeConfig::default();
        overlay.network.http_timeout_secs = 999;

        let merged = RuntimeConfigLoader::merge_runtime_config(base, overlay);
        assert_eq!(merged.network.http_timeout_secs, 999);
        assert_eq!(
            merged.update.feed_uri.as_deref(),
            Some("https://base.example/releases")
        );
    }
}
