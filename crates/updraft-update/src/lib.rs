//! Self-update engine for a standalone desktop executable
//!
//! Provides:
//! - Deployment context detection (in-place update, archive, temp, Downloads)
//! - Release feed checks with prerelease and ignored-tag policy
//! - Streaming side-by-side downloads with progress and cancellation
//! - Update application: exit wait, atomic replace, relaunch and cleanup
//! - Setup command dispatch (install, uninstall, apply-update, cleanup)

pub mod applier;
pub mod command;
pub mod deployment;
pub mod download;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod process;
pub mod progress;
pub mod registrar;
pub mod releases;
pub mod version;

pub use applier::{AppliedUpdate, UpdateApplier};
pub use command::{Command, Invocation};
pub use deployment::{Deployment, DeploymentContext, PackageType};
pub use download::{DownloadOutcome, DownloadPipeline, DownloadedFile};
pub use engine::{CheckOptions, DispatchOutcome, Engine, EngineBuilder, UpdateOutcome};
pub use error::{Result, UpdateError};
pub use lifecycle::{Lifecycle, LifecycleEvent, LifecycleState};
pub use process::{DetachedLauncher, ProcessLauncher, ProcessMonitor, SysinfoMonitor};
pub use progress::{ChannelReporter, NoProgress, ProgressModel, ProgressReporter, ProgressState};
pub use registrar::{InstallationRegistrar, NoopRegistrar, Registration};
pub use releases::{ReleaseDescriptor, ReleaseResolver, UpdateInfo};
pub use version::SemanticVersion;
