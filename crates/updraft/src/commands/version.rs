//! Version command

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use updraft_core::EngineConfig;
use updraft_update::{Engine, SemanticVersion, UpdateError};
use url::Url;

use crate::cli::VersionArgs;
use crate::output;

/// Identity the engine resolved for the running program
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub name: String,
    pub product_name: String,
    pub version: SemanticVersion,
    pub prerelease: bool,
    pub executable: PathBuf,

    /// Release feed checks would query; `None` when nothing is configured
    pub feed: Option<Url>,
}

impl VersionInfo {
    pub fn new(config: &EngineConfig, feed: Option<Url>) -> Result<Self> {
        let version = SemanticVersion::parse(config.version())
            .with_context(|| format!("Invalid program version '{}'", config.version()))?;

        Ok(Self {
            name: config.name().to_string(),
            product_name: config.product_name().to_string(),
            prerelease: version.prerelease().is_some(),
            version,
            executable: config.full_path().to_path_buf(),
            feed,
        })
    }

    /// Read the identity and the effective release feed from `engine`
    pub fn from_engine(engine: &Engine) -> Result<Self> {
        let feed = match engine.feed_uri(&engine.check_options()) {
            Ok(feed) => Some(feed),
            Err(UpdateError::FeedNotConfigured) => None,
            Err(e) => return Err(e).context("Failed to resolve release feed"),
        };
        Self::new(engine.config(), feed)
    }

    pub fn display(&self) -> String {
        let mut line = format!("{} {}", self.product_name, self.version);
        if self.prerelease {
            line.push_str(" (prerelease)");
        }
        line
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

pub fn run(engine: &Engine, args: &VersionArgs) -> Result<()> {
    let info = VersionInfo::from_engine(engine)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    output::header(&info.display());
    output::kv("Name", &info.name);
    output::kv("Executable", &info.executable.display().to_string());
    output::kv(
        "Release feed",
        info.feed.as_ref().map(Url::as_str).unwrap_or("(not configured)"),
    );

    Ok(())
}
