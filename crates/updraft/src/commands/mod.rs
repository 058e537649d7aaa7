//! CLI command implementations

pub mod check;
pub mod context;
pub mod setup;
pub mod update;
pub mod version;

use anyhow::{bail, Context, Result};
use camino::Utf8Path;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use updraft_core::{EngineConfig, EngineOverrides, EnvironmentDefaults, RuntimeConfigLoader};
use updraft_update::{
    CheckOptions, Command, Engine, Invocation, NoProgress, ProgressReporter,
};

use crate::cli::{GlobalFlags, PolicyArgs};
use crate::output::BarReporter;

/// Resolve the engine identity for this executable and load runtime settings
pub fn build_engine(config: Option<&Utf8Path>) -> Result<Engine> {
    let mut loader = RuntimeConfigLoader::new()?;
    if let Some(path) = config {
        if !path.exists() {
            bail!("Config file not found: {}", path);
        }
        loader = loader.with_file(path.to_path_buf());
    }
    let runtime = loader.load().context("Failed to load runtime config")?;

    let identity = EngineConfig::resolve(
        EngineOverrides::default(),
        updraft_core::binary_metadata!(),
        EnvironmentDefaults::detect(),
    )
    .context("Failed to resolve program identity")?;
    debug!(
        "Running {} {} from {}",
        identity.name(),
        identity.version(),
        identity.full_path().display()
    );

    Ok(Engine::builder(identity).runtime(runtime).build()?)
}

/// Invocation carrying the global flags
pub fn invocation(command: Command, flags: &GlobalFlags) -> Invocation {
    Invocation::new(command)
        .with_launch(flags.launch)
        .with_silent(flags.silent)
        .with_elevate(flags.elevate)
}

/// `Some` when the running file is an update artifact that must apply itself
pub fn forced_invocation(engine: &Engine, flags: &GlobalFlags) -> Option<Invocation> {
    let resolved = engine.resolve_invocation(invocation(Command::None, flags));
    (resolved.command == Command::ApplyUpdate).then_some(resolved)
}

/// Overlay command-line policy flags on the configured check options
pub fn apply_policy(mut options: CheckOptions, policy: PolicyArgs) -> CheckOptions {
    options.allow_prerelease |= policy.prerelease;
    options.ignore_tags.extend(policy.ignore_tags);
    if policy.asset.is_some() {
        options.asset_name = policy.asset;
    }
    if policy.feed.is_some() {
        options.feed = policy.feed;
    }
    options
}

/// Progress sink for the current output mode
pub fn progress(flags: &GlobalFlags) -> Box<dyn ProgressReporter> {
    if flags.silent {
        Box::new(NoProgress)
    } else {
        Box::new(BarReporter::new())
    }
}

/// Token cancelled on Ctrl-C
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, cancelling");
            child.cancel();
        }
    });
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_apply_policy_overlays_flags() {
        let configured = CheckOptions {
            allow_prerelease: false,
            ignore_tags: vec!["v0.9.0".to_string()],
            asset_name: None,
            feed: None,
        };
        let policy = PolicyArgs {
            prerelease: true,
            ignore_tags: vec!["v1.0.0".to_string()],
            asset: Some("MyApp-win64.exe".to_string()),
            feed: Some(Url::parse("https://example.com/releases").unwrap()),
        };

        let options = apply_policy(configured, policy);
        assert!(options.allow_prerelease);
        assert_eq!(options.ignore_tags, vec!["v0.9.0", "v1.0.0"]);
        assert_eq!(options.asset_name.as_deref(), Some("MyApp-win64.exe"));
        assert!(options.feed.is_some());
    }

    #[test]
    fn test_apply_policy_keeps_configured_values() {
        let configured = CheckOptions {
            allow_prerelease: true,
            ignore_tags: Vec::new(),
            asset_name: Some("custom.exe".to_string()),
            feed: None,
        };

        let options = apply_policy(configured, PolicyArgs::default());
        assert!(options.allow_prerelease);
        assert_eq!(options.asset_name.as_deref(), Some("custom.exe"));
    }

    #[test]
    fn test_invocation_carries_flags() {
        let flags = GlobalFlags {
            silent: true,
            launch: true,
            elevate: false,
        };
        let invocation = invocation(Command::Install, &flags);
        assert_eq!(invocation.command, Command::Install);
        assert!(invocation.silent && invocation.launch && !invocation.elevate);
    }
}
