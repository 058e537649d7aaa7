//! Update application: wait for running instances, replace, relaunch, clean up
//!
//! Within one `apply_update` call the exit wait always finishes (or times
//! out) before the destination is touched, and the destination is fully
//! replaced before anything is relaunched.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use updraft_core::EngineConfig;
use walkdir::WalkDir;

use crate::error::{Result, UpdateError};
use crate::process::{quiescence_wait, ProcessLauncher, ProcessMonitor};

/// What an `apply_update` call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedUpdate {
    pub source: PathBuf,
    pub destination: PathBuf,

    /// Executable that was started afterwards, if any
    pub relaunched: Option<PathBuf>,
}

/// Swaps an update into place
#[derive(Clone)]
pub struct UpdateApplier {
    config: Arc<EngineConfig>,
    monitor: Arc<dyn ProcessMonitor>,
    launcher: Arc<dyn ProcessLauncher>,

    /// Per-process exit wait
    exit_timeout: Duration,
}

impl UpdateApplier {
    pub fn new(
        config: Arc<EngineConfig>,
        monitor: Arc<dyn ProcessMonitor>,
        launcher: Arc<dyn ProcessLauncher>,
        exit_timeout: Duration,
    ) -> Self {
        Self {
            config,
            monitor,
            launcher,
            exit_timeout,
        }
    }

    /// Destination for an in-place executable update: the sibling file with
    /// the update suffix replaced by the executable extension
    pub fn derive_destination(&self, source: &Path) -> Result<PathBuf> {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let base = self.config.strip_update_suffix(&file_name).ok_or_else(|| {
            UpdateError::MissingDestination {
                path: source.to_path_buf(),
            }
        })?;

        Ok(source.with_file_name(self.config.executable_name(base)))
    }

    /// Replace `destination` with `source` and optionally start it.
    ///
    /// A directory source (an extracted archive) is copied file by file into
    /// the destination directory. If the destination is still locked after
    /// the exit wait, the filesystem error is returned as is.
    pub async fn apply_update(
        &self,
        source: &Path,
        destination: Option<&Path>,
        relaunch: bool,
    ) -> Result<AppliedUpdate> {
        let destination = match destination {
            Some(destination) => destination.to_path_buf(),
            None => self.derive_destination(source)?,
        };

        let source_is_dir = source.is_dir();
        let executable = if source_is_dir {
            destination.join(self.config.file_name())
        } else {
            destination.clone()
        };

        let image_name = executable
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.config.file_name().to_string());
        self.wait_for_exit(image_name).await?;

        info!(
            "Applying update {} -> {}",
            source.display(),
            destination.display()
        );
        let (from, to) = (source.to_path_buf(), destination.clone());
        tokio::task::spawn_blocking(move || {
            if source_is_dir {
                replace_tree(&from, &to)
            } else {
                replace_file(&from, &to)
            }
        })
        .await??;

        let relaunched = if relaunch {
            let args = vec![
                self.config.setup_argument().to_string(),
                "cleanup".to_string(),
                source.to_string_lossy().into_owned(),
            ];
            self.launcher.launch(&executable, &args)?;
            Some(executable)
        } else {
            None
        };

        Ok(AppliedUpdate {
            source: source.to_path_buf(),
            destination,
            relaunched,
        })
    }

    /// Delete a leftover update artifact once the updated program runs.
    ///
    /// Waits for other instances of this program and of the artifact itself
    /// first. A target that no longer exists is not an error.
    pub async fn cleanup(&self, target: &Path) -> Result<()> {
        self.wait_for_exit(self.config.file_name().to_string())
            .await?;
        if let Some(name) = target.file_name() {
            self.wait_for_exit(name.to_string_lossy().into_owned())
                .await?;
        }

        let target = target.to_path_buf();
        tokio::task::spawn_blocking(move || remove_path(&target)).await?
    }

    /// Run the blocking exit wait off the async executor
    async fn wait_for_exit(&self, image_name: String) -> Result<()> {
        let monitor = Arc::clone(&self.monitor);
        let timeout = self.exit_timeout;
        tokio::task::spawn_blocking(move || quiescence_wait(monitor.as_ref(), &image_name, timeout))
            .await?;
        Ok(())
    }
}

/// Atomically replace `destination` with a copy of `source`.
///
/// The copy is written to a temp file in the destination directory and then
/// renamed over the destination, so the destination is never left truncated.
pub fn replace_file(source: &Path, destination: &Path) -> Result<()> {
    let directory = destination
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory).map_err(|e| UpdateError::io(directory, e))?;

    let prefix = format!(
        ".{}.",
        destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );
    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(directory)
        .map_err(|e| UpdateError::io(directory, e))?;

    let mut input = File::open(source).map_err(|e| UpdateError::io(source, e))?;
    std::io::copy(&mut input, temp.as_file_mut()).map_err(|e| UpdateError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| UpdateError::io(temp.path(), e))?;

    let permissions = fs::metadata(source)
        .map_err(|e| UpdateError::io(source, e))?
        .permissions();
    fs::set_permissions(temp.path(), permissions).map_err(|e| UpdateError::io(temp.path(), e))?;

    temp.persist(destination)
        .map_err(|e| UpdateError::io(destination, e.error))?;

    debug!("Replaced {}", destination.display());
    Ok(())
}

/// Copy every file under `source` into `destination`, replacing each atomically
fn replace_tree(source: &Path, destination: &Path) -> Result<()> {
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            UpdateError::io(&path, e.into())
        })?;

        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| UpdateError::MissingDestination {
                path: entry.path().to_path_buf(),
            })?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| UpdateError::io(&target, e))?;
        } else {
            replace_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn remove_path(target: &Path) -> Result<()> {
    let result = if target.is_dir() {
        fs::remove_dir_all(target)
    } else {
        fs::remove_file(target)
    };

    match result {
        Ok(()) => {
            info!("Removed {}", target.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Nothing to clean up at {}", target.display());
            Ok(())
        }
        Err(e) => Err(UpdateError::io(target, e)),
    }
}
