//! OS registration seam used by install and uninstall
//!
//! Writing "installed programs" entries and shortcuts is platform-specific;
//! the engine only builds the [`Registration`] and hands it to an
//! [`InstallationRegistrar`].

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;

/// Everything an OS registrar needs to describe an installed program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    /// Registry key / entry identifier (GUID or short name)
    pub key_name: String,
    pub display_name: String,
    pub display_version: String,
    pub publisher: Option<String>,
    pub install_location: PathBuf,

    /// Installed executable
    pub executable: PathBuf,

    /// Icon resource, `"<exe>,0"`
    pub display_icon: String,
    pub install_date: NaiveDate,
    pub uninstall_command: String,
    pub quiet_uninstall_command: String,

    /// Installed size in KiB
    pub estimated_size_kib: u64,

    /// Name of the start menu and desktop shortcuts
    pub shortcut_name: String,
}

/// Writes and removes OS install metadata
pub trait InstallationRegistrar: Send + Sync {
    fn register(&self, registration: &Registration) -> Result<()>;

    fn unregister(&self, key_name: &str, shortcut_name: &str) -> Result<()>;
}

/// Registrar for platforms without install metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRegistrar;

impl InstallationRegistrar for NoopRegistrar {
    fn register(&self, registration: &Registration) -> Result<()> {
        debug!(
            "Skipping OS registration of {} ({})",
            registration.display_name, registration.key_name
        );
        Ok(())
    }

    fn unregister(&self, key_name: &str, _shortcut_name: &str) -> Result<()> {
        debug!("Skipping OS unregistration of {}", key_name);
        Ok(())
    }
}
