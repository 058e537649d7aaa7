//! Engine identity resolution
//!
//! The identity of the program being updated is resolved once, from three
//! sources with the following precedence (high to low):
//! 1. Explicit overrides supplied by the embedding application
//! 2. Metadata baked into the binary at compile time (`binary_metadata!()`)
//! 3. Defaults computed from the running executable and the known folders
//!
//! The result is an immutable [`EngineConfig`].

use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::KnownFolders;

/// Marker appended to side-by-side update artifacts and update folders
pub const DEFAULT_UPDATE_SUFFIX: &str = if cfg!(windows) {
    ".update.exe"
} else {
    ".update"
};

/// Leading argument that introduces a setup command on the command line
pub const DEFAULT_SETUP_ARGUMENT: &str = "setup";

/// Values supplied explicitly by the embedding application.
///
/// Every field is optional; anything left unset is inferred.
#[derive(Debug, Clone, Default)]
pub struct EngineOverrides {
    pub name: Option<String>,
    pub file_name: Option<String>,
    pub product_name: Option<String>,
    pub company_name: Option<String>,
    pub full_path: Option<PathBuf>,
    pub version: Option<String>,
    pub asset_name: Option<String>,
    pub install_path: Option<PathBuf>,
    pub update_suffix: Option<String>,
    pub executable_extension: Option<String>,
    pub setup_argument: Option<String>,
    pub update_uri: Option<String>,
    pub guid: Option<Uuid>,
}

/// Metadata compiled into the embedding binary.
///
/// Usually captured with [`binary_metadata!`](crate::binary_metadata) so the
/// `CARGO_PKG_*` values come from the embedding crate, not from updraft.
#[derive(Debug, Clone, Default)]
pub struct BinaryMetadata {
    pub version: Option<String>,
    pub product_name: Option<String>,
    /// Raw `CARGO_PKG_AUTHORS` value; the first author becomes the company
    pub authors: Option<String>,
    /// Source repository URL, used to infer a GitHub release feed
    pub repository: Option<String>,
    /// Explicit release feed URL
    pub update_uri: Option<String>,
    /// Program GUID as text
    pub guid: Option<String>,
}

/// Capture [`BinaryMetadata`] from the calling crate's package manifest.
#[macro_export]
macro_rules! binary_metadata {
    () => {
        $crate::config::BinaryMetadata {
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            product_name: Some(env!("CARGO_PKG_NAME").to_string()),
            authors: option_env!("CARGO_PKG_AUTHORS")
                .filter(|s| !s.is_empty())
                .map(String::from),
            repository: option_env!("CARGO_PKG_REPOSITORY")
                .filter(|s| !s.is_empty())
                .map(String::from),
            update_uri: option_env!("UPDRAFT_FEED_URL").map(String::from),
            guid: option_env!("UPDRAFT_PROGRAM_GUID").map(String::from),
        }
    };
}

/// Facts about the running environment
#[derive(Debug, Clone)]
pub struct EnvironmentDefaults {
    /// Absolute path of the running executable
    pub current_exe: Option<PathBuf>,

    /// OS special folders
    pub folders: KnownFolders,
}

impl EnvironmentDefaults {
    /// Inspect the current process and user folders
    pub fn detect() -> Self {
        Self {
            current_exe: std::env::current_exe().ok(),
            folders: KnownFolders::detect(),
        }
    }
}

/// Resolved, immutable engine identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    name: String,
    file_name: String,
    product_name: String,
    company_name: Option<String>,
    full_path: PathBuf,
    version: String,
    asset_name: String,
    install_path: PathBuf,
    update_suffix: String,
    executable_extension: String,
    setup_argument: String,
    update_uri: Option<Url>,
    guid: Option<Uuid>,
}

impl EngineConfig {
    /// Merge overrides, binary metadata and environment defaults into one value
    pub fn resolve(
        overrides: EngineOverrides,
        metadata: BinaryMetadata,
        env: EnvironmentDefaults,
    ) -> Result<Self> {
        let full_path = overrides
            .full_path
            .or(env.current_exe)
            .ok_or_else(|| Error::missing_field("full_path"))?;

        let executable_extension = overrides
            .executable_extension
            .unwrap_or_else(|| std::env::consts::EXE_SUFFIX.to_string());

        let file_name = match overrides.file_name {
            Some(name) => name,
            None => full_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| Error::missing_field("file_name"))?,
        };

        let name = overrides
            .name
            .unwrap_or_else(|| strip_extension(&file_name, &executable_extension).to_string());
        if name.trim().is_empty() {
            return Err(Error::missing_field("name"));
        }

        let version = overrides
            .version
            .or(metadata.version)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::missing_field("version"))?;

        let update_suffix = overrides
            .update_suffix
            .unwrap_or_else(|| DEFAULT_UPDATE_SUFFIX.to_string());
        if update_suffix.is_empty() {
            return Err(Error::invalid_config("update suffix must not be empty"));
        }

        let install_path = match overrides.install_path {
            Some(path) => path,
            None => env
                .folders
                .default_install_path(&name)
                .ok_or_else(|| Error::missing_field("install_path"))?,
        };

        let company_name = overrides
            .company_name
            .or_else(|| metadata.authors.as_deref().and_then(first_author));

        let update_uri = match overrides.update_uri.or(metadata.update_uri) {
            Some(raw) => Some(Url::parse(&raw).map_err(|e| Error::invalid_uri(raw.clone(), e))?),
            None => metadata
                .repository
                .as_deref()
                .and_then(github_feed_from_repository)
                .or_else(|| {
                    company_name
                        .as_deref()
                        .and_then(|company| inferred_github_feed(company, &name))
                }),
        };

        let guid = match overrides.guid {
            Some(guid) => Some(guid),
            None => match metadata.guid.as_deref().map(str::trim) {
                Some(raw) if !raw.is_empty() => {
                    Some(Uuid::parse_str(raw).map_err(|e| Error::invalid_guid(raw, e))?)
                }
                _ => None,
            },
        };

        let config = Self {
            product_name: overrides
                .product_name
                .or(metadata.product_name)
                .unwrap_or_else(|| name.clone()),
            asset_name: overrides.asset_name.unwrap_or_else(|| file_name.clone()),
            setup_argument: overrides
                .setup_argument
                .unwrap_or_else(|| DEFAULT_SETUP_ARGUMENT.to_string()),
            name,
            file_name,
            company_name,
            full_path,
            version,
            install_path,
            update_suffix,
            executable_extension,
            update_uri,
            guid,
        };

        debug!(
            "Resolved engine config: name={}, version={}, path={:?}",
            config.name, config.version, config.full_path
        );

        Ok(config)
    }

    /// Short program name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name of the executable, including its extension
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn company_name(&self) -> Option<&str> {
        self.company_name.as_deref()
    }

    /// Absolute path of the executable
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Version string of the running program
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Name of the release asset that carries this program
    pub fn asset_name(&self) -> &str {
        &self.asset_name
    }

    /// Where a per-user install places the program
    pub fn install_path(&self) -> &Path {
        &self.install_path
    }

    pub fn update_suffix(&self) -> &str {
        &self.update_suffix
    }

    /// Extension carried by executables on this platform (`.exe` or empty)
    pub fn executable_extension(&self) -> &str {
        &self.executable_extension
    }

    pub fn setup_argument(&self) -> &str {
        &self.setup_argument
    }

    /// Release feed, if one could be resolved
    pub fn update_uri(&self) -> Option<&Url> {
        self.update_uri.as_ref()
    }

    pub fn guid(&self) -> Option<Uuid> {
        self.guid
    }

    /// Key under which the program is registered with the OS
    pub fn uninstall_key_name(&self) -> String {
        match self.guid {
            Some(guid) => guid.to_string(),
            None => self.name.clone(),
        }
    }

    /// The update suffix without a trailing executable extension.
    ///
    /// `.update.exe` becomes `.update`; a suffix without the extension is
    /// returned unchanged.
    pub fn update_marker(&self) -> &str {
        let ext = self.executable_extension.as_str();
        match strip_suffix_ignore_ascii_case(&self.update_suffix, ext) {
            Some(marker) if !ext.is_empty() && !marker.is_empty() => marker,
            _ => &self.update_suffix,
        }
    }

    /// Strip the executable extension from a file name, if present
    pub fn base_name<'a>(&self, file_name: &'a str) -> &'a str {
        strip_extension(file_name, &self.executable_extension)
    }

    /// Base name of an update artifact, or `None` if the file is not one.
    ///
    /// `MyApp.update.exe` yields `MyApp` with the default suffix; with a
    /// `.patch` suffix, `MyApp.patch.exe` yields `MyApp`.
    pub fn strip_update_suffix<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        if let Some(base) = strip_suffix_ignore_ascii_case(file_name, &self.update_suffix) {
            if !base.is_empty() {
                return Some(base);
            }
        }

        strip_suffix_ignore_ascii_case(self.base_name(file_name), self.update_marker())
            .filter(|base| !base.is_empty())
    }

    /// Whether a directory name marks an extracted update archive
    pub fn is_update_folder_name(&self, dir_name: &str) -> bool {
        ends_with_ignore_ascii_case(dir_name, &self.update_suffix)
            || ends_with_ignore_ascii_case(dir_name, self.update_marker())
    }

    /// File name of the executable a given base name is deployed as
    pub fn executable_name(&self, base: &str) -> String {
        format!("{}{}", base, self.executable_extension)
    }

    /// Side-by-side file name a download of this program is written to
    pub fn update_artifact_name(&self) -> String {
        format!("{}{}", self.base_name(&self.file_name), self.update_suffix)
    }
}

/// Case-insensitive `str::strip_suffix` for ASCII suffixes
pub fn strip_suffix_ignore_ascii_case<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    if suffix.len() > value.len() {
        return None;
    }
    let split = value.len() - suffix.len();
    if !value.is_char_boundary(split) {
        return None;
    }
    if value[split..].eq_ignore_ascii_case(suffix) {
        Some(&value[..split])
    } else {
        None
    }
}

fn ends_with_ignore_ascii_case(value: &str, suffix: &str) -> bool {
    !suffix.is_empty() && strip_suffix_ignore_ascii_case(value, suffix).is_some()
}

fn strip_extension<'a>(file_name: &'a str, extension: &str) -> &'a str {
    if extension.is_empty() {
        return file_name;
    }
    match strip_suffix_ignore_ascii_case(file_name, extension) {
        Some(base) if !base.is_empty() => base,
        _ => file_name,
    }
}

/// `"Jane Doe <jane@example.com>:Other"` -> `"Jane Doe"`
fn first_author(authors: &str) -> Option<String> {
    let first = authors.split(':').next()?;
    let name = first.split('<').next()?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// `https://github.com/owner/repo(.git)` -> GitHub releases API URL
fn github_feed_from_repository(repository: &str) -> Option<Url> {
    let url = Url::parse(repository).ok()?;
    if url.host_str()? != "github.com" {
        return None;
    }
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    Url::parse(&format!(
        "https://api.github.com/repos/{}/{}/releases",
        owner, repo
    ))
    .ok()
}

fn inferred_github_feed(company: &str, name: &str) -> Option<Url> {
    let owner: String = company.chars().filter(|c| !c.is_whitespace()).collect();
    let repo: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Url::parse(&format!(
        "https://api.github.com/repos/{}/{}/releases",
        owner, repo
    ))
    .ok()
}
