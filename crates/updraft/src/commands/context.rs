//! Context command

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use updraft_update::{Deployment, Engine};
use url::Url;

use crate::cli::ContextArgs;
use crate::output;

#[derive(Debug, Serialize)]
struct ContextReport<'a> {
    name: &'a str,
    product_name: &'a str,
    version: &'a str,
    executable: &'a Path,
    install_path: &'a Path,
    update_uri: Option<&'a Url>,
    deployment: Deployment,
}

pub fn run(engine: &Engine, args: ContextArgs) -> Result<()> {
    let config = engine.config();
    let report = ContextReport {
        name: config.name(),
        product_name: config.product_name(),
        version: config.version(),
        executable: config.full_path(),
        install_path: config.install_path(),
        update_uri: config.update_uri(),
        deployment: engine.deployment(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::header(&format!("{} {}", report.product_name, report.version));
    output::kv("Executable", &report.executable.display().to_string());
    output::kv("Install path", &report.install_path.display().to_string());
    output::kv(
        "Release feed",
        report.update_uri.map(Url::as_str).unwrap_or("(not configured)"),
    );

    match &report.deployment {
        Deployment::Context(context) => {
            output::kv("Package", &format!("{:?}", context.package_type));
            output::kv("Pending update", yes_no(context.is_update));
            output::kv("Deployed", yes_no(context.is_deployed));
            output::kv("Source", &context.update_source.display().to_string());
            output::kv("Destination", &context.update_destination.display().to_string());
        }
        Deployment::Installed => output::kv("Deployment", "installed"),
        Deployment::Unrecognized => output::kv("Deployment", "unrecognized location"),
    }

    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
