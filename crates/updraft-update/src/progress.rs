//! Progress notifications for download and apply

use serde::Serialize;
use tokio::sync::mpsc;

/// Caption reported when a download is cancelled
pub const CANCELLED_CAPTION: &str = "Update cancelled. Ready.";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressState {
    Ready,
    Updating,
    Done,
}

/// One progress notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressModel {
    pub state: ProgressState,
    pub caption: String,

    /// Percentage in `0..=100`, when the total size is known
    pub percent: Option<u8>,
}

impl ProgressModel {
    pub fn ready(caption: impl Into<String>, percent: Option<u8>) -> Self {
        Self {
            state: ProgressState::Ready,
            caption: caption.into(),
            percent,
        }
    }

    pub fn updating(caption: impl Into<String>, percent: Option<u8>) -> Self {
        Self {
            state: ProgressState::Updating,
            caption: caption.into(),
            percent,
        }
    }

    pub fn done(caption: impl Into<String>) -> Self {
        Self {
            state: ProgressState::Done,
            caption: caption.into(),
            percent: Some(100),
        }
    }
}

/// Receives progress notifications
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: ProgressModel);
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressModel) + Send + Sync,
{
    fn report(&self, progress: ProgressModel) {
        self(progress)
    }
}

/// Discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _progress: ProgressModel) {}
}

/// Forwards notifications into a channel; dropped receivers are ignored
#[derive(Debug, Clone)]
pub struct ChannelReporter(pub mpsc::UnboundedSender<ProgressModel>);

impl ProgressReporter for ChannelReporter {
    fn report(&self, progress: ProgressModel) {
        let _ = self.0.send(progress);
    }
}

/// Turns byte counts into monotonic percentages and captions
#[derive(Debug, Clone)]
pub(crate) struct PercentTracker {
    total: Option<u64>,
    last: u8,
}

impl PercentTracker {
    pub(crate) fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            last: 0,
        }
    }

    /// Percentage for `downloaded` bytes; never decreases and only reaches
    /// 100 once the advertised total has been received
    pub(crate) fn percent(&mut self, downloaded: u64) -> Option<u8> {
        let total = self.total?;
        let raw = (u128::from(downloaded) * 100 / u128::from(total)).min(100) as u8;
        let bounded = if downloaded < total { raw.min(99) } else { raw };
        self.last = self.last.max(bounded);
        Some(self.last)
    }

    pub(crate) fn last(&self) -> Option<u8> {
        self.total.map(|_| self.last)
    }

    pub(crate) fn caption(&self, downloaded: u64) -> String {
        match self.total {
            Some(total) => format!(
                "Downloaded {:.2} MB of {:.2} MB",
                downloaded as f64 / BYTES_PER_MB,
                total as f64 / BYTES_PER_MB
            ),
            None => format!("Downloaded {:.2} MB", downloaded as f64 / BYTES_PER_MB),
        }
    }
}
