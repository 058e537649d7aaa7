//! The update engine: one instance per running program
//!
//! Owns the HTTP client, the injected OS collaborators and the lifecycle
//! state, and exposes one entry point per setup command.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use updraft_core::{EngineConfig, Error as CoreError, KnownFolders, RuntimeConfig};
use url::Url;

use crate::applier::{replace_file, AppliedUpdate, UpdateApplier};
use crate::command::{Command, Invocation};
use crate::deployment::{self, Deployment};
use crate::download::{artifact_path, DownloadOutcome, DownloadPipeline, DownloadedFile};
use crate::error::{Result, UpdateError};
use crate::lifecycle::{Lifecycle, LifecycleEvent, LifecycleState};
use crate::process::{DetachedLauncher, ProcessLauncher, ProcessMonitor, SysinfoMonitor};
use crate::progress::{NoProgress, ProgressModel, ProgressReporter};
use crate::registrar::{InstallationRegistrar, NoopRegistrar, Registration};
use crate::releases::{ReleaseResolver, UpdateInfo, UpdateQuery};
use crate::version::SemanticVersion;

/// Release selection policy for a single check
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub allow_prerelease: bool,
    pub ignore_tags: Vec<String>,

    /// Overrides the configured asset name
    pub asset_name: Option<String>,

    /// Overrides the configured release feed
    pub feed: Option<Url>,
}

/// Result of [`Engine::update`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No release or asset matched the policy
    NoUpdate,

    /// The newest eligible release is not newer than the running version
    UpToDate(UpdateInfo),

    /// The download was cancelled; a partial artifact may remain
    Cancelled(UpdateInfo),

    /// The update was downloaded and started; the caller should exit
    Handoff {
        info: UpdateInfo,
        file: DownloadedFile,
    },
}

/// Result of [`Engine::dispatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not a setup invocation; run the program normally
    Continue,
    Installed(PathBuf),
    Uninstalled,
    Applied(AppliedUpdate),
    CleanedUp(PathBuf),
}

/// Builder for [`Engine`] with injectable collaborators
pub struct EngineBuilder {
    config: EngineConfig,
    runtime: RuntimeConfig,
    folders: Option<KnownFolders>,
    client: Option<reqwest::Client>,
    registrar: Arc<dyn InstallationRegistrar>,
    launcher: Arc<dyn ProcessLauncher>,
    monitor: Arc<dyn ProcessMonitor>,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            runtime: RuntimeConfig::default(),
            folders: None,
            client: None,
            registrar: Arc::new(NoopRegistrar),
            launcher: Arc::new(DetachedLauncher),
            monitor: Arc::new(SysinfoMonitor::new()),
        }
    }

    pub fn runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn folders(mut self, folders: KnownFolders) -> Self {
        self.folders = Some(folders);
        self
    }

    /// Use a caller-owned HTTP client instead of building one
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn registrar(mut self, registrar: Arc<dyn InstallationRegistrar>) -> Self {
        self.registrar = registrar;
        self
    }

    pub fn launcher(mut self, launcher: Arc<dyn ProcessLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn monitor(mut self, monitor: Arc<dyn ProcessMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Build the engine; fails if the running version is not a semantic version
    pub fn build(self) -> Result<Engine> {
        let current_version = SemanticVersion::parse(self.config.version())?;

        let network = &self.runtime.network;
        let client = match self.client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .user_agent(&network.user_agent)
                .timeout(Duration::from_secs(network.http_timeout_secs))
                .build()?,
        };

        let config = Arc::new(self.config);
        let pipeline = DownloadPipeline::new(client.clone())
            .with_chunk_size(network.download_chunk_size)
            .with_timeout(Duration::from_secs(network.download_timeout_secs));
        let applier = UpdateApplier::new(
            Arc::clone(&config),
            self.monitor,
            Arc::clone(&self.launcher),
            Duration::from_millis(self.runtime.applier.exit_wait_timeout_ms),
        );

        Ok(Engine {
            config,
            current_version,
            folders: self.folders.unwrap_or_else(KnownFolders::detect),
            resolver: ReleaseResolver::new(client),
            pipeline,
            applier,
            registrar: self.registrar,
            launcher: self.launcher,
            lifecycle: Lifecycle::new(),
            runtime: self.runtime,
        })
    }
}

/// Self-update engine for the running program
pub struct Engine {
    config: Arc<EngineConfig>,
    runtime: RuntimeConfig,
    current_version: SemanticVersion,
    folders: KnownFolders,
    resolver: ReleaseResolver,
    pipeline: DownloadPipeline,
    applier: UpdateApplier,
    registrar: Arc<dyn InstallationRegistrar>,
    launcher: Arc<dyn ProcessLauncher>,
    lifecycle: Lifecycle,
}

impl Engine {
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn runtime(&self) -> &RuntimeConfig {
        &self.runtime
    }

    pub fn current_version(&self) -> &SemanticVersion {
        &self.current_version
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Observe lifecycle changes
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }

    /// Classify the running executable's location
    pub fn deployment(&self) -> Deployment {
        deployment::resolve(self.config.full_path(), &self.config, &self.folders)
    }

    /// Check policy taken from the runtime configuration
    pub fn check_options(&self) -> CheckOptions {
        CheckOptions {
            allow_prerelease: self.runtime.update.allow_prerelease,
            ignore_tags: self.runtime.update.ignore_tags.clone(),
            asset_name: None,
            feed: None,
        }
    }

    /// Release feed: explicit option, then runtime config, then engine identity
    pub fn feed_uri(&self, options: &CheckOptions) -> Result<Url> {
        if let Some(feed) = &options.feed {
            return Ok(feed.clone());
        }
        if let Some(raw) = self.runtime.update.feed_uri.as_deref() {
            return Url::parse(raw)
                .map_err(|e| UpdateError::Config(CoreError::invalid_uri(raw, e)));
        }
        self.config
            .update_uri()
            .cloned()
            .ok_or(UpdateError::FeedNotConfigured)
    }

    /// Command adjusted for how the program was started
    pub fn resolve_invocation(&self, invocation: Invocation) -> Invocation {
        invocation.for_executable(&self.config, self.config.full_path())
    }

    /// Run the operation for a setup command
    pub async fn dispatch(
        &self,
        invocation: Invocation,
        progress: &dyn ProgressReporter,
    ) -> Result<DispatchOutcome> {
        let invocation = self.resolve_invocation(invocation);
        debug!("Dispatching {:?}", invocation);

        match invocation.command {
            Command::None => Ok(DispatchOutcome::Continue),
            Command::Install => {
                let installed = self
                    .install(invocation.target.as_deref(), invocation.silent, progress)
                    .await?;
                Ok(DispatchOutcome::Installed(installed))
            }
            Command::Uninstall => {
                self.uninstall(invocation.silent, progress)?;
                Ok(DispatchOutcome::Uninstalled)
            }
            Command::ApplyUpdate => {
                let (source, destination) = self.apply_paths(invocation.target);
                let applied = self
                    .apply_update(&source, destination.as_deref(), invocation.launch)
                    .await?;
                Ok(DispatchOutcome::Applied(applied))
            }
            Command::Cleanup => {
                let target = invocation
                    .target
                    .unwrap_or_else(|| self.default_artifact_path());
                self.cleanup(&target).await?;
                Ok(DispatchOutcome::CleanedUp(target))
            }
            command @ (Command::Update | Command::Service) => {
                Err(UpdateError::CommandNotImplemented { command })
            }
        }
    }

    /// Source and destination for an apply request
    fn apply_paths(&self, target: Option<PathBuf>) -> (PathBuf, Option<PathBuf>) {
        let executable = self.config.full_path().to_path_buf();
        if target.is_some() {
            return (executable, target);
        }
        match self.deployment() {
            Deployment::Context(context) if context.is_update => {
                (context.update_source, Some(context.update_destination))
            }
            _ => (executable, None),
        }
    }

    /// Where downloads of this program are written
    pub fn default_artifact_path(&self) -> PathBuf {
        artifact_path(self.config.full_path(), &self.config.update_artifact_name())
    }

    /// Query the release feed once.
    ///
    /// `Ok(None)` means no eligible release or asset; the info returned
    /// otherwise may not be an upgrade.
    pub async fn check_for_update(&self, options: &CheckOptions) -> Result<Option<UpdateInfo>> {
        self.lifecycle.advance(LifecycleEvent::CheckRequested)?;
        match self.query_feed(options).await {
            Ok(info) => {
                self.lifecycle.advance(LifecycleEvent::CheckCompleted)?;
                Ok(info)
            }
            Err(e) => {
                self.lifecycle.fail();
                Err(e)
            }
        }
    }

    async fn query_feed(&self, options: &CheckOptions) -> Result<Option<UpdateInfo>> {
        let feed = self.feed_uri(options)?;
        let query = UpdateQuery {
            asset_name: options
                .asset_name
                .as_deref()
                .unwrap_or(self.config.asset_name()),
            allow_prerelease: options.allow_prerelease,
            ignore_tags: &options.ignore_tags,
            current_version: &self.current_version,
        };
        self.resolver.check_for_update(&feed, &query).await
    }

    /// Download an update next to the running executable
    pub async fn download(
        &self,
        info: &UpdateInfo,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome> {
        self.pipeline
            .download(info, &self.default_artifact_path(), progress, cancel)
            .await
    }

    /// Check, download and hand off to the downloaded copy.
    ///
    /// On [`UpdateOutcome::Handoff`] the downloaded artifact has been started
    /// with `apply-update` (plus `--launch` unless relaunch is disabled) and
    /// the caller should exit so that it can be replaced.
    pub async fn update(
        &self,
        options: &CheckOptions,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<UpdateOutcome> {
        self.lifecycle.advance(LifecycleEvent::CheckRequested)?;
        let result = self.run_update(options, progress, cancel).await;
        if result.is_err() {
            self.lifecycle.fail();
        }
        result
    }

    async fn run_update(
        &self,
        options: &CheckOptions,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<UpdateOutcome> {
        progress.report(ProgressModel::updating("Checking for updates", None));

        let info = match self.query_feed(options).await? {
            Some(info) if info.is_upgrade() => info,
            Some(info) => {
                self.lifecycle.advance(LifecycleEvent::NoUpgrade)?;
                progress.report(ProgressModel::ready("Up to date", None));
                return Ok(UpdateOutcome::UpToDate(info));
            }
            None => {
                self.lifecycle.advance(LifecycleEvent::NoUpgrade)?;
                progress.report(ProgressModel::ready("No update available", None));
                return Ok(UpdateOutcome::NoUpdate);
            }
        };

        self.lifecycle.advance(LifecycleEvent::UpgradeFound)?;
        let file = match self.download(&info, progress, cancel).await? {
            DownloadOutcome::Completed(file) => file,
            DownloadOutcome::Cancelled => {
                self.lifecycle.advance(LifecycleEvent::DownloadCancelled)?;
                return Ok(UpdateOutcome::Cancelled(info));
            }
        };
        self.lifecycle.advance(LifecycleEvent::DownloadCompleted)?;

        let args = Invocation::new(Command::ApplyUpdate)
            .with_launch(self.runtime.applier.relaunch)
            .to_args(self.config.setup_argument());
        self.launcher.launch(&file.path, &args)?;
        info!("Started update {} from {}", info.version, file.path.display());

        Ok(UpdateOutcome::Handoff { info, file })
    }

    /// Replace `destination` (derived from `source` when absent) with `source`
    pub async fn apply_update(
        &self,
        source: &Path,
        destination: Option<&Path>,
        relaunch: bool,
    ) -> Result<AppliedUpdate> {
        self.lifecycle.advance(LifecycleEvent::ApplyRequested)?;
        match self.applier.apply_update(source, destination, relaunch).await {
            Ok(applied) => {
                self.lifecycle.advance(LifecycleEvent::Applied)?;
                Ok(applied)
            }
            Err(e) => {
                self.lifecycle.fail();
                Err(e)
            }
        }
    }

    /// Delete a leftover update artifact
    pub async fn cleanup(&self, target: &Path) -> Result<()> {
        self.lifecycle.advance(LifecycleEvent::CleanupRequested)?;
        let result = self.applier.cleanup(target).await;
        match &result {
            Ok(()) => {
                self.lifecycle.advance(LifecycleEvent::CleanupFinished)?;
            }
            Err(_) => self.lifecycle.fail(),
        }
        result
    }

    /// Copy the running executable into the install directory and register it
    pub async fn install(
        &self,
        install_dir: Option<&Path>,
        silent: bool,
        progress: &dyn ProgressReporter,
    ) -> Result<PathBuf> {
        let install_dir = install_dir
            .unwrap_or(self.config.install_path())
            .to_path_buf();
        let installed = install_dir.join(self.config.file_name());
        let source = self.config.full_path().to_path_buf();

        if installed != source {
            let (from, to) = (source.clone(), installed.clone());
            tokio::task::spawn_blocking(move || replace_file(&from, &to)).await??;
            info!("Installed {} to {}", self.config.name(), installed.display());
        } else {
            debug!("Already running from {}", installed.display());
        }

        let size = std::fs::metadata(&installed)
            .map_err(|e| UpdateError::io(&installed, e))?
            .len();
        let registration = self.registration(&install_dir, &installed, size);
        self.registrar.register(&registration)?;

        if !silent {
            progress.report(ProgressModel::done("Installed successfully"));
        }
        Ok(installed)
    }

    /// Install metadata for the program at `executable`
    pub fn registration(&self, install_dir: &Path, executable: &Path, size: u64) -> Registration {
        let exe = executable.display();
        Registration {
            key_name: self.config.uninstall_key_name(),
            display_name: self.config.product_name().to_string(),
            display_version: self.config.version().to_string(),
            publisher: self.config.company_name().map(String::from),
            install_location: install_dir.to_path_buf(),
            executable: executable.to_path_buf(),
            display_icon: format!("{},0", exe),
            install_date: Local::now().date_naive(),
            uninstall_command: format!(
                "\"{}\" {} uninstall",
                exe,
                self.config.setup_argument()
            ),
            quiet_uninstall_command: format!(
                "\"{}\" {} uninstall --silent",
                exe,
                self.config.setup_argument()
            ),
            estimated_size_kib: size / 1024,
            shortcut_name: self.config.product_name().to_string(),
        }
    }

    /// Remove OS registration; installed files are left in place
    pub fn uninstall(&self, silent: bool, progress: &dyn ProgressReporter) -> Result<()> {
        self.registrar.unregister(
            &self.config.uninstall_key_name(),
            self.config.product_name(),
        )?;
        if !silent {
            progress.report(ProgressModel::done("Uninstalled successfully"));
        }
        Ok(())
    }

    /// Start `target` (the running executable by default)
    pub fn launch(&self, target: Option<&Path>, args: &[String]) -> Result<()> {
        let target = target.unwrap_or(self.config.full_path());
        self.launcher.launch(target, args)
    }

    /// Optionally register the program, then run a full update
    pub async fn ensure_updated(
        &self,
        register: bool,
        options: &CheckOptions,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<UpdateOutcome> {
        if register {
            self.install(None, true, &NoProgress).await?;
        }
        self.update(options, progress, cancel).await
    }
}
