//! Operating system special folders

use std::path::PathBuf;

/// Special folders consulted when classifying the executable's location.
///
/// Looked up once and passed around by value so that classification stays a
/// pure function of its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownFolders {
    /// Root of the OS temporary-files area
    pub temp: PathBuf,

    /// The user's Downloads folder, when the platform has one
    pub downloads: Option<PathBuf>,

    /// Per-user local application data (`%LocalAppData%`, `~/.local/share`)
    pub local_data: Option<PathBuf>,
}

impl KnownFolders {
    /// Look up the folders for the current user
    pub fn detect() -> Self {
        Self {
            temp: std::env::temp_dir(),
            downloads: dirs::download_dir(),
            local_data: dirs::data_local_dir(),
        }
    }

    /// Default per-user install location for a program with the given short name
    pub fn default_install_path(&self, name: &str) -> Option<PathBuf> {
        self.local_data
            .as_ref()
            .map(|dir| dir.join("Programs").join(name))
    }
}
