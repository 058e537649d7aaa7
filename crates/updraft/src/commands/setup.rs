//! Setup command: install, uninstall, apply-update and cleanup

use anyhow::{Context, Result};
use tracing::debug;
use updraft_update::{Command, DispatchOutcome, Engine, Invocation};

use crate::cli::{GlobalFlags, SetupArgs};
use crate::output;

pub async fn run(engine: &Engine, args: SetupArgs, flags: &GlobalFlags) -> Result<()> {
    // A bare `setup` installs
    let mut invocation = super::invocation(args.action.unwrap_or(Command::Install), flags);
    if let Some(target) = args.target {
        invocation = invocation.with_target(target);
    }
    dispatch(engine, invocation, flags).await
}

/// Hand a resolved invocation to the engine and report the outcome
pub async fn dispatch(engine: &Engine, invocation: Invocation, flags: &GlobalFlags) -> Result<()> {
    if invocation.elevate && !flags.silent {
        output::warning("Elevation is not available; continuing with current privileges");
    }

    let command = invocation.command;
    let launch = invocation.launch;
    let outcome = {
        let progress = super::progress(flags);
        engine
            .dispatch(invocation, progress.as_ref())
            .await
            .with_context(|| format!("setup {} failed", command))?
    };

    match outcome {
        DispatchOutcome::Continue => debug!("Nothing to do for {}", command),
        DispatchOutcome::Installed(path) => {
            if !flags.silent {
                output::success(&format!(
                    "Installed {} to {}",
                    engine.config().product_name(),
                    path.display()
                ));
            }
            if launch {
                engine.launch(Some(path.as_path()), &[])?;
            }
        }
        DispatchOutcome::Uninstalled => {
            if !flags.silent {
                output::success(&format!("Uninstalled {}", engine.config().product_name()));
            }
        }
        DispatchOutcome::Applied(applied) => {
            if !flags.silent {
                output::success(&format!("Updated {}", applied.destination.display()));
                if let Some(relaunched) = &applied.relaunched {
                    output::info(&format!("Restarted {}", relaunched.display()));
                }
            }
        }
        DispatchOutcome::CleanedUp(target) => debug!("Cleaned up {}", target.display()),
    }

    Ok(())
}
