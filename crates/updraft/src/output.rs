//! Terminal output utilities

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use updraft_update::{ProgressModel, ProgressReporter, ProgressState};

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Create a spinner
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(template.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Renders engine progress notifications as a percentage bar
pub struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        if let Ok(template) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
        ) {
            bar.set_style(template.progress_chars("#>-"));
        }
        Self { bar }
    }
}

impl Default for BarReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BarReporter {
    fn drop(&mut self) {
        // An error left the bar mid-way
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl ProgressReporter for BarReporter {
    fn report(&self, progress: ProgressModel) {
        if let Some(percent) = progress.percent {
            self.bar.set_position(u64::from(percent));
        }
        match progress.state {
            ProgressState::Updating => self.bar.set_message(progress.caption),
            ProgressState::Ready => self.bar.abandon_with_message(progress.caption),
            ProgressState::Done => self.bar.finish_with_message(progress.caption),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_follows_progress() {
        let reporter = BarReporter::new();
        reporter.report(ProgressModel::updating("Downloaded 1.00 MB of 2.50 MB", Some(40)));
        assert_eq!(reporter.bar.position(), 40);
        assert!(!reporter.bar.is_finished());

        reporter.report(ProgressModel::done("Download complete"));
        assert_eq!(reporter.bar.position(), 100);
        assert!(reporter.bar.is_finished());
    }

    #[test]
    fn test_cancel_keeps_last_percent() {
        let reporter = BarReporter::new();
        reporter.report(ProgressModel::updating("Downloading", Some(62)));
        reporter.report(ProgressModel::ready("Update cancelled. Ready.", Some(62)));
        assert_eq!(reporter.bar.position(), 62);
        assert!(reporter.bar.is_finished());
    }
}
