//! Process enumeration, exit waits and detached launches

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};
use tracing::{debug, warn};

use crate::error::{Result, UpdateError};

/// Finds running processes and waits for them to exit
pub trait ProcessMonitor: Send + Sync {
    /// PIDs of processes whose image name matches, excluding the current process
    fn find_by_name(&self, image_name: &str) -> Vec<u32>;

    /// Block until `pid` exits or `timeout` elapses; `true` if it exited
    fn wait_for_exit(&self, pid: u32, timeout: Duration) -> bool;
}

/// Starts programs
pub trait ProcessLauncher: Send + Sync {
    /// Start `program` detached from the current process
    fn launch(&self, program: &Path, args: &[String]) -> Result<()>;
}

/// [`ProcessMonitor`] backed by the OS process table
#[derive(Debug, Clone)]
pub struct SysinfoMonitor {
    poll_interval: Duration,
}

impl SysinfoMonitor {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl Default for SysinfoMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessMonitor for SysinfoMonitor {
    fn find_by_name(&self, image_name: &str) -> Vec<u32> {
        let current = std::process::id();
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);

        system
            .processes()
            .iter()
            .filter(|(pid, _)| pid.as_u32() != current)
            // Linux lists each thread as its own task entry
            .filter(|(_, process)| process.thread_kind().is_none())
            .filter(|(_, process)| {
                image_matches(process.name(), image_name)
                    || process
                        .exe()
                        .and_then(Path::file_name)
                        .is_some_and(|exe| image_matches(exe, image_name))
            })
            .map(|(pid, _)| pid.as_u32())
            .collect()
    }

    fn wait_for_exit(&self, pid: u32, timeout: Duration) -> bool {
        let pid = Pid::from_u32(pid);
        let deadline = Instant::now() + timeout;
        let mut system = System::new();

        loop {
            system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            match system.process(pid) {
                None => return true,
                Some(process) if process.status() == ProcessStatus::Zombie => return true,
                Some(_) => {}
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep(self.poll_interval.min(deadline - now));
        }
    }
}

/// Compare a process image name to a target, ignoring case and an `.exe` extension
fn image_matches(candidate: &OsStr, target: &str) -> bool {
    let candidate = candidate.to_string_lossy();
    strip_exe(&candidate).eq_ignore_ascii_case(strip_exe(target))
}

fn strip_exe(name: &str) -> &str {
    updraft_core::config::strip_suffix_ignore_ascii_case(name, ".exe").unwrap_or(name)
}

/// Wait for every other process running `image_name` to exit.
///
/// Best effort: each process gets at most `timeout`, and processes that are
/// still running afterwards are only logged.
pub fn quiescence_wait(monitor: &dyn ProcessMonitor, image_name: &str, timeout: Duration) {
    let pids = monitor.find_by_name(image_name);
    if pids.is_empty() {
        debug!("No other {} processes running", image_name);
        return;
    }

    debug!("Waiting for {} {} process(es) to exit", pids.len(), image_name);
    for pid in pids {
        if !monitor.wait_for_exit(pid, timeout) {
            warn!(
                "Process {} ({}) still running after {}ms",
                pid,
                image_name,
                timeout.as_millis()
            );
        }
    }
}

/// [`ProcessLauncher`] that spawns a detached child with no inherited stdio
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedLauncher;

impl ProcessLauncher for DetachedLauncher {
    fn launch(&self, program: &Path, args: &[String]) -> Result<()> {
        debug!("Launching {} {:?}", program.display(), args);

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        if let Some(dir) = program.parent().filter(|d| !d.as_os_str().is_empty()) {
            command.current_dir(dir);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
            command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        }

        command
            .spawn()
            .map(|_| ())
            .map_err(|e| UpdateError::io(program, e))
    }
}
