//! Setup commands handed to the engine by a command-line front end

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use updraft_core::EngineConfig;

/// Setup command requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    /// Not a setup invocation; the program runs normally
    #[default]
    None,
    Install,
    Update,
    ApplyUpdate,
    Uninstall,
    Service,
    Cleanup,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::None => "none",
            Command::Install => "install",
            Command::Update => "update",
            Command::ApplyUpdate => "apply-update",
            Command::Uninstall => "uninstall",
            Command::Service => "service",
            Command::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = String;

    /// Case-insensitive; dashes and underscores are ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "none" => Ok(Command::None),
            "install" => Ok(Command::Install),
            "update" => Ok(Command::Update),
            "applyupdate" => Ok(Command::ApplyUpdate),
            "uninstall" => Ok(Command::Uninstall),
            "service" => Ok(Command::Service),
            "cleanup" => Ok(Command::Cleanup),
            _ => Err(format!("Unknown command: {}", s.trim())),
        }
    }
}

/// A resolved command plus its flags
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Invocation {
    pub command: Command,

    /// Start the program once the command finishes
    pub launch: bool,

    /// Suppress user-facing progress
    pub silent: bool,

    /// Request elevated privileges
    pub elevate: bool,

    /// Command-specific path (install location, apply destination, cleanup target)
    pub target: Option<PathBuf>,
}

impl Invocation {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            ..Default::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_launch(mut self, launch: bool) -> Self {
        self.launch = launch;
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_elevate(mut self, elevate: bool) -> Self {
        self.elevate = elevate;
        self
    }

    /// Force `ApplyUpdate` when `executable` is an update artifact.
    ///
    /// A side-by-side update is always applied, whatever was parsed from the
    /// command line.
    pub fn for_executable(mut self, config: &EngineConfig, executable: &Path) -> Self {
        let is_artifact = executable
            .file_name()
            .map(|n| n.to_string_lossy())
            .is_some_and(|name| config.strip_update_suffix(&name).is_some());

        if is_artifact && self.command != Command::ApplyUpdate {
            self.command = Command::ApplyUpdate;
            self.target = None;
        }
        self
    }

    /// Command-line arguments that reproduce this invocation
    pub fn to_args(&self, setup_argument: &str) -> Vec<String> {
        let mut args = vec![setup_argument.to_string(), self.command.to_string()];
        if let Some(target) = &self.target {
            args.push(target.to_string_lossy().into_owned());
        }
        if self.launch {
            args.push("--launch".to_string());
        }
        if self.silent {
            args.push("--silent".to_string());
        }
        if self.elevate {
            args.push("--elevate".to_string());
        }
        args
    }
}
