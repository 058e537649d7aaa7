//! Deployment context classification
//!
//! Works out where the running executable lives and, when it is running as
//! an update artifact or from a temporary location, where the update comes
//! from and where it should go. Classification is a pure function of the
//! executable path, the engine identity and the known folders.

use std::path::{Path, PathBuf};

use serde::Serialize;
use updraft_core::{EngineConfig, KnownFolders};

/// How the program was packaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    None,
    Executable,
    Archive,
    Msi,
    Msix,
}

/// Source and destination of a pending deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentContext {
    pub package_type: PackageType,

    /// The running copy is an update waiting to be applied
    pub is_update: bool,

    /// The program already lives at its deployed location
    pub is_deployed: bool,

    /// File or directory holding the new program
    pub update_source: PathBuf,

    /// File or directory the program should end up at
    pub update_destination: PathBuf,
}

/// Classification of the running executable's location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Deployment {
    /// Running as an update, from a temp extraction or from Downloads
    Context(DeploymentContext),

    /// Running from the configured install path
    Installed,

    /// Running from anywhere else
    Unrecognized,
}

impl Deployment {
    pub fn context(&self) -> Option<&DeploymentContext> {
        match self {
            Deployment::Context(context) => Some(context),
            _ => None,
        }
    }

    /// `true` if the running copy is an update that should be applied
    pub fn is_update(&self) -> bool {
        self.context().is_some_and(|c| c.is_update)
    }

    pub fn is_deployed(&self) -> bool {
        match self {
            Deployment::Context(context) => context.is_deployed,
            Deployment::Installed | Deployment::Unrecognized => true,
        }
    }
}

/// Classify `executable`. The first matching rule wins:
///
/// 1. the file name carries the update suffix: in-place executable update
/// 2. the containing directory carries the suffix: extracted archive update
/// 3. the directory is under the temp folder: archive run from a temp extraction
/// 4. the directory is under Downloads: archive subfolder or a bare download
/// 5. otherwise the program counts as deployed
pub fn resolve(executable: &Path, config: &EngineConfig, folders: &KnownFolders) -> Deployment {
    let file_name = executable
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let directory = executable.parent().unwrap_or_else(|| Path::new(""));

    if let Some(base) = config.strip_update_suffix(&file_name) {
        return Deployment::Context(DeploymentContext {
            package_type: PackageType::Executable,
            is_update: true,
            is_deployed: true,
            update_source: executable.to_path_buf(),
            update_destination: directory.join(config.executable_name(base)),
        });
    }

    let directory_name = directory
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    if config.is_update_folder_name(&directory_name) {
        if let Some(parent) = directory.parent() {
            return Deployment::Context(DeploymentContext {
                package_type: PackageType::Archive,
                is_update: true,
                is_deployed: true,
                update_source: directory.to_path_buf(),
                update_destination: parent.to_path_buf(),
            });
        }
    }

    if directory.starts_with(&folders.temp) {
        return Deployment::Context(DeploymentContext {
            package_type: PackageType::Archive,
            is_update: false,
            is_deployed: false,
            update_source: directory.to_path_buf(),
            update_destination: config.install_path().to_path_buf(),
        });
    }

    if let Some(downloads) = folders.downloads.as_deref() {
        if directory.starts_with(downloads) {
            let context = if directory.parent() == Some(downloads) {
                DeploymentContext {
                    package_type: PackageType::Archive,
                    is_update: true,
                    is_deployed: false,
                    update_source: directory.to_path_buf(),
                    update_destination: downloads.to_path_buf(),
                }
            } else {
                DeploymentContext {
                    package_type: PackageType::Executable,
                    is_update: false,
                    is_deployed: false,
                    update_source: executable.to_path_buf(),
                    update_destination: config.install_path().to_path_buf(),
                }
            };
            return Deployment::Context(context);
        }
    }

    if directory.starts_with(config.install_path()) {
        Deployment::Installed
    } else {
        Deployment::Unrecognized
    }
}
