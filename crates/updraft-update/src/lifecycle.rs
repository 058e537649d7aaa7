//! Update lifecycle state machine
//!
//! One engine instance moves through
//! `Idle -> CheckingForUpdate -> Downloading -> Applying -> CleaningUp`.
//! Applying and cleaning up usually happen in later process instances,
//! which enter the machine directly from `Idle`.

use serde::Serialize;
use tokio::sync::watch;

use crate::error::{Result, UpdateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
    Idle,
    CheckingForUpdate,
    Downloading,
    Applying,
    CleaningUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleEvent {
    CheckRequested,
    UpgradeFound,
    NoUpgrade,
    /// Check-only request finished; nothing will be downloaded
    CheckCompleted,
    DownloadCompleted,
    DownloadCancelled,
    ApplyRequested,
    Applied,
    CleanupRequested,
    CleanupFinished,
    Failed,
}

impl LifecycleState {
    /// State after `event`, or `None` if the event is not valid here
    pub fn next(self, event: LifecycleEvent) -> Option<LifecycleState> {
        use LifecycleEvent as E;
        use LifecycleState as S;

        match (self, event) {
            (_, E::Failed) => Some(S::Idle),
            (S::Idle, E::CheckRequested) => Some(S::CheckingForUpdate),
            (S::CheckingForUpdate, E::UpgradeFound) => Some(S::Downloading),
            (S::CheckingForUpdate, E::NoUpgrade | E::CheckCompleted) => Some(S::Idle),
            (S::Downloading, E::DownloadCompleted) => Some(S::Applying),
            (S::Downloading, E::DownloadCancelled) => Some(S::Idle),
            (S::Idle, E::ApplyRequested) => Some(S::Applying),
            (S::Applying, E::Applied) => Some(S::CleaningUp),
            (S::Idle, E::CleanupRequested) => Some(S::CleaningUp),
            (S::CleaningUp, E::CleanupFinished) => Some(S::Idle),
            _ => None,
        }
    }
}

/// Observable lifecycle of one engine instance
#[derive(Debug)]
pub struct Lifecycle {
    state: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (state, _) = watch::channel(LifecycleState::Idle);
        Self { state }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Apply `event`, notifying subscribers on change
    pub fn advance(&self, event: LifecycleEvent) -> Result<LifecycleState> {
        let mut outcome = Ok(LifecycleState::Idle);
        self.state.send_if_modified(|state| match state.next(event) {
            Some(next) => {
                outcome = Ok(next);
                let changed = *state != next;
                *state = next;
                changed
            }
            None => {
                outcome = Err(UpdateError::InvalidTransition {
                    from: *state,
                    event,
                });
                false
            }
        });
        outcome
    }

    /// Return to `Idle` after a failure
    pub fn fail(&self) {
        let _ = self.advance(LifecycleEvent::Failed);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
