//! Recording fakes for the engine's OS collaborators

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use updraft_update::registrar::{InstallationRegistrar, Registration};
use updraft_update::{ProcessLauncher, ProcessMonitor, ProgressModel, ProgressReporter};

/// Ordered log of collaborator calls shared between fakes
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Monitor that reports fixed PIDs and records what it was asked.
///
/// When `watch` is set, every wait records the watched file's content so a
/// test can tell whether the file had already been replaced.
#[derive(Debug, Default)]
pub struct RecordingMonitor {
    pub pids: Vec<u32>,
    pub exits: bool,
    pub watch: Option<PathBuf>,
    pub log: EventLog,
}

impl RecordingMonitor {
    pub fn new(log: &EventLog) -> Self {
        Self {
            pids: Vec::new(),
            exits: true,
            watch: None,
            log: log.clone(),
        }
    }

    pub fn with_pids(mut self, pids: &[u32]) -> Self {
        self.pids = pids.to_vec();
        self
    }

    pub fn never_exits(mut self) -> Self {
        self.exits = false;
        self
    }

    pub fn watching(mut self, path: &Path) -> Self {
        self.watch = Some(path.to_path_buf());
        self
    }
}

impl ProcessMonitor for RecordingMonitor {
    fn find_by_name(&self, image_name: &str) -> Vec<u32> {
        self.log.push(format!("find:{}", image_name));
        self.pids.clone()
    }

    fn wait_for_exit(&self, pid: u32, _timeout: Duration) -> bool {
        let content = self
            .watch
            .as_ref()
            .and_then(|p| std::fs::read(p).ok())
            .map(|c| String::from_utf8_lossy(&c).into_owned())
            .unwrap_or_default();
        self.log.push(format!("wait:{}:{}", pid, content));
        self.exits
    }
}

/// Launcher that records launches instead of starting processes
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    pub launches: Mutex<Vec<(PathBuf, Vec<String>)>>,
    pub log: EventLog,
}

impl RecordingLauncher {
    pub fn new(log: &EventLog) -> Self {
        Self {
            launches: Mutex::new(Vec::new()),
            log: log.clone(),
        }
    }

    pub fn launches(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.launches.lock().unwrap().clone()
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn launch(&self, program: &Path, args: &[String]) -> updraft_update::Result<()> {
        let content = std::fs::read(program)
            .map(|c| String::from_utf8_lossy(&c).into_owned())
            .unwrap_or_default();
        self.log.push(format!("launch:{}", content));
        self.launches
            .lock()
            .unwrap()
            .push((program.to_path_buf(), args.to_vec()));
        Ok(())
    }
}

/// Registrar that keeps registrations in memory
#[derive(Debug, Default)]
pub struct RecordingRegistrar {
    pub registered: Mutex<Vec<Registration>>,
    pub unregistered: Mutex<Vec<(String, String)>>,
}

impl InstallationRegistrar for RecordingRegistrar {
    fn register(&self, registration: &Registration) -> updraft_update::Result<()> {
        self.registered.lock().unwrap().push(registration.clone());
        Ok(())
    }

    fn unregister(&self, key_name: &str, shortcut_name: &str) -> updraft_update::Result<()> {
        self.unregistered
            .lock()
            .unwrap()
            .push((key_name.to_string(), shortcut_name.to_string()));
        Ok(())
    }
}

/// Progress sink that keeps every notification
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub seen: Mutex<Vec<ProgressModel>>,
}

impl CollectingReporter {
    pub fn snapshot(&self) -> Vec<ProgressModel> {
        self.seen.lock().unwrap().clone()
    }

    /// Percentages reported while updating
    pub fn percents(&self) -> Vec<u8> {
        self.snapshot().iter().filter_map(|p| p.percent).collect()
    }
}

impl ProgressReporter for CollectingReporter {
    fn report(&self, progress: ProgressModel) {
        self.seen.lock().unwrap().push(progress);
    }
}
