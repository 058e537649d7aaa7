//! Update command

use anyhow::Result;
use updraft_update::{Engine, UpdateOutcome};

use crate::cli::{GlobalFlags, UpdateArgs};
use crate::output;

pub async fn run(engine: &Engine, args: UpdateArgs, flags: &GlobalFlags) -> Result<()> {
    let options = super::apply_policy(engine.check_options(), args.policy);
    let cancel = super::cancel_on_ctrl_c();

    let outcome = {
        let progress = super::progress(flags);
        engine.update(&options, progress.as_ref(), &cancel).await?
    };

    if flags.silent {
        return Ok(());
    }

    match outcome {
        UpdateOutcome::NoUpdate => output::warning("No release with a matching asset was found"),
        UpdateOutcome::UpToDate(info) => {
            output::success(&format!("Already on the latest version ({})", info.current_version))
        }
        UpdateOutcome::Cancelled(info) => {
            output::warning(&format!("Update to {} cancelled", info.version))
        }
        UpdateOutcome::Handoff { info, file } => {
            output::success(&format!(
                "Downloaded {} to {}",
                info.version,
                file.path.display()
            ));
            output::info("Restarting to finish the update");
        }
    }

    Ok(())
}
