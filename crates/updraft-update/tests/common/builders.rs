//! Builders for engine identity, known folders and release feeds

use std::path::{Path, PathBuf};

use updraft_core::{BinaryMetadata, EngineConfig, EngineOverrides, EnvironmentDefaults, KnownFolders};
use updraft_update::releases::{AssetDescriptor, ReleaseDescriptor};

use super::constants::*;

/// Folders rooted under `root`, laid out like a Windows user profile
pub fn folders_under(root: &Path) -> KnownFolders {
    KnownFolders {
        temp: root.join("AppData").join("Local").join("Temp"),
        downloads: Some(root.join("Downloads")),
        local_data: Some(root.join("AppData").join("Local")),
    }
}

/// Builder for [`EngineConfig`] with Windows-style naming on every platform
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    overrides: EngineOverrides,
    metadata: BinaryMetadata,
    folders: KnownFolders,
}

impl ConfigBuilder {
    pub fn new(executable: &Path, folders: &KnownFolders) -> Self {
        Self {
            overrides: EngineOverrides {
                full_path: Some(executable.to_path_buf()),
                name: Some(APP_NAME.to_string()),
                file_name: Some(APP_EXE.to_string()),
                update_suffix: Some(UPDATE_SUFFIX.to_string()),
                executable_extension: Some(EXE_EXTENSION.to_string()),
                ..Default::default()
            },
            metadata: BinaryMetadata {
                version: Some(VERSION_1_0_0.to_string()),
                product_name: Some("My App".to_string()),
                authors: Some("Acme".to_string()),
                ..Default::default()
            },
            folders: folders.clone(),
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.overrides.version = Some(version.to_string());
        self
    }

    pub fn suffix(mut self, suffix: &str) -> Self {
        self.overrides.update_suffix = Some(suffix.to_string());
        self
    }

    pub fn feed(mut self, uri: &str) -> Self {
        self.overrides.update_uri = Some(uri.to_string());
        self
    }

    pub fn install_path(mut self, path: &Path) -> Self {
        self.overrides.install_path = Some(path.to_path_buf());
        self
    }

    pub fn without_company(mut self) -> Self {
        self.metadata.authors = None;
        self
    }

    pub fn build(self) -> EngineConfig {
        EngineConfig::resolve(
            self.overrides,
            self.metadata,
            EnvironmentDefaults {
                current_exe: None,
                folders: self.folders,
            },
        )
        .expect("test config should resolve")
    }
}

/// Builder for feed entries
#[derive(Debug, Clone)]
pub struct ReleaseBuilder {
    release: ReleaseDescriptor,
}

impl ReleaseBuilder {
    pub fn new(tag: &str) -> Self {
        Self {
            release: ReleaseDescriptor {
                name: Some(format!("Release {}", tag)),
                tag_name: tag.to_string(),
                prerelease: false,
                assets: Vec::new(),
            },
        }
    }

    pub fn prerelease(mut self) -> Self {
        self.release.prerelease = true;
        self
    }

    pub fn asset(mut self, name: &str, url: &str) -> Self {
        let id = self.release.assets.len() as u64 + 1;
        self.release.assets.push(AssetDescriptor {
            id,
            name: name.to_string(),
            browser_download_url: url.to_string(),
            content_type: Some("application/octet-stream".to_string()),
            size: NEW_BINARY.len() as u64,
            created_at: None,
            updated_at: None,
        });
        self
    }

    pub fn build(self) -> ReleaseDescriptor {
        self.release
    }
}

/// Serialize releases as the feed would return them
pub fn feed_json(releases: &[ReleaseDescriptor]) -> String {
    serde_json::to_string(releases).expect("feed serializes")
}

/// Write `content` to `dir/name`, creating `dir`
pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
