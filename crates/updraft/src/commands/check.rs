//! Check command

use anyhow::Result;
use updraft_update::Engine;

use crate::cli::{CheckArgs, GlobalFlags};
use crate::output;

pub async fn run(engine: &Engine, args: CheckArgs, flags: &GlobalFlags) -> Result<()> {
    let options = super::apply_policy(engine.check_options(), args.policy);

    if args.json {
        let info = engine.check_for_update(&options).await?;
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    output::info(&format!("Current version: {}", engine.current_version()));

    let spinner = (!flags.silent).then(|| output::spinner("Checking for updates..."));
    let result = engine.check_for_update(&options).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match result? {
        Some(info) if info.is_upgrade() => {
            output::success(&format!("Update available: {}", info.version));
            if let Some(release) = &info.release_name {
                output::kv("Release", release);
            }
            output::kv("Asset", &info.name);
            output::kv("Size", &format!("{:.2} MB", info.size as f64 / (1024.0 * 1024.0)));
            if info.is_prerelease {
                output::kv("Channel", "prerelease");
            }
            output::info("Run 'updraft update' to install the update");
        }
        Some(_) => output::success("Already on the latest version"),
        None => output::warning("No release with a matching asset was found"),
    }

    Ok(())
}
