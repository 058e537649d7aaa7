//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use updraft_update::Command;
use url::Url;

/// Updraft - self-update host for desktop executables
#[derive(Parser, Debug)]
#[command(name = "updraft")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output and progress
    #[arg(short = 'q', long, visible_alias = "quiet", global = true)]
    pub silent: bool,

    /// Start the program once the command completes
    #[arg(long, visible_aliases = ["start", "run"], global = true)]
    pub launch: bool,

    /// Request elevated privileges for setup commands
    #[arg(long, visible_aliases = ["admin", "uac"], global = true)]
    pub elevate: bool,

    /// Path to a runtime config file (default: ~/.updraft/updraft-runtime.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn flags(&self) -> GlobalFlags {
        GlobalFlags {
            silent: self.silent,
            launch: self.launch,
            elevate: self.elevate,
        }
    }
}

/// Flags that apply to every subcommand
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalFlags {
    pub silent: bool,
    pub launch: bool,
    pub elevate: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a setup command (install, apply-update, cleanup, ...)
    Setup(SetupArgs),

    /// Check the release feed for a newer version
    Check(CheckArgs),

    /// Download the newest release and hand over to it
    Update(UpdateArgs),

    /// Show how the running executable is deployed
    Context(ContextArgs),

    /// Show version information
    Version(VersionArgs),
}

// Setup command
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Setup action (defaults to install)
    #[arg(value_parser = parse_command)]
    pub action: Option<Command>,

    /// File or directory the action applies to
    pub target: Option<PathBuf>,
}

fn parse_command(value: &str) -> Result<Command, String> {
    value.parse()
}

/// Release selection flags shared by check and update
#[derive(Args, Debug, Default)]
pub struct PolicyArgs {
    /// Include prereleases
    #[arg(long)]
    pub prerelease: bool,

    /// Skip a release tag (repeatable)
    #[arg(long = "ignore-tag", value_name = "TAG")]
    pub ignore_tags: Vec<String>,

    /// Release asset to download
    #[arg(long, value_name = "NAME")]
    pub asset: Option<String>,

    /// Release feed URI
    #[arg(long, value_name = "URI")]
    pub feed: Option<Url>,
}

// Check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub policy: PolicyArgs,
}

// Context command
#[derive(Args, Debug)]
pub struct ContextArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_setup_parses_action_and_target() {
        let cli = Cli::parse_from(["updraft", "setup", "apply_update", "/tmp/MyApp.exe", "--launch"]);
        assert!(cli.launch);
        match cli.command {
            Commands::Setup(args) => {
                assert_eq!(args.action, Some(Command::ApplyUpdate));
                assert_eq!(args.target, Some(PathBuf::from("/tmp/MyApp.exe")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bare_setup_has_no_action() {
        let cli = Cli::parse_from(["updraft", "setup"]);
        assert!(matches!(cli.command, Commands::Setup(SetupArgs { action: None, .. })));
    }

    #[test]
    fn test_unknown_setup_action_rejected() {
        assert!(Cli::try_parse_from(["updraft", "setup", "reinstall"]).is_err());
    }

    #[test]
    fn test_flag_aliases() {
        let cli = Cli::parse_from(["updraft", "--quiet", "--start", "--uac", "context"]);
        let flags = cli.flags();
        assert!(flags.silent && flags.launch && flags.elevate);
    }

    #[test]
    fn test_check_policy_flags() {
        let cli = Cli::parse_from([
            "updraft",
            "check",
            "--prerelease",
            "--ignore-tag",
            "v1.0.0",
            "--ignore-tag",
            "v1.1.0",
            "--feed",
            "https://example.com/releases",
            "--json",
        ]);
        match cli.command {
            Commands::Check(args) => {
                assert!(args.json);
                assert!(args.policy.prerelease);
                assert_eq!(args.policy.ignore_tags, vec!["v1.0.0", "v1.1.0"]);
                assert_eq!(
                    args.policy.feed.unwrap().as_str(),
                    "https://example.com/releases"
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
