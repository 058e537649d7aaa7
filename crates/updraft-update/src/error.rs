//! Error types for the update engine

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::command::Command;
use crate::lifecycle::{LifecycleEvent, LifecycleState};

/// Result type alias using the update engine's error type
pub type Result<T> = std::result::Result<T, UpdateError>;

/// Hard failures of the update lifecycle.
///
/// "No update available" and "download cancelled" are not errors; they are
/// reported through `Option` and [`DownloadOutcome`](crate::DownloadOutcome).
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Engine identity or runtime configuration could not be resolved
    #[error(transparent)]
    Config(#[from] updraft_core::Error),

    /// Transport-level HTTP failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Request to {uri} failed with status {status}")]
    HttpStatus {
        status: reqwest::StatusCode,
        uri: String,
    },

    /// The release feed did not have the expected shape
    #[error("Malformed release feed: {message}")]
    MalformedFeed { message: String },

    /// A tag or version string is not a semantic version
    #[error("Invalid version '{input}': {reason}")]
    VersionParse { input: String, reason: String },

    /// Filesystem failure, including a destination still locked after the exit wait
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No release feed could be resolved for this program
    #[error("No update feed is configured")]
    FeedNotConfigured,

    /// The update destination could not be derived from the source path
    #[error("Cannot derive an update destination from {}", path.display())]
    MissingDestination { path: PathBuf },

    /// The command is recognized but has no implementation in the dispatcher
    #[error("Command '{command}' is not implemented")]
    CommandNotImplemented { command: Command },

    /// The lifecycle received an event that is not valid in its current state
    #[error("Invalid lifecycle transition: {event:?} while {from:?}")]
    InvalidTransition {
        from: LifecycleState,
        event: LifecycleEvent,
    },

    /// A blocking task was aborted
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl UpdateError {
    /// Create an I/O error bound to a path
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a version parse error
    pub fn version_parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::VersionParse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed feed error
    pub fn malformed_feed(message: impl Into<String>) -> Self {
        Self::MalformedFeed {
            message: message.into(),
        }
    }
}
