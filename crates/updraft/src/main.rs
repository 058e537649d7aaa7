//! Updraft CLI - self-update host for desktop executables
//!
//! This is the main entry point for the updraft command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.silent);

    let engine = commands::build_engine(cli.config.as_deref())?;
    let flags = cli.flags();

    // A side-by-side update copy always applies itself, whatever it was asked to do
    if let Some(invocation) = commands::forced_invocation(&engine, &flags) {
        return commands::setup::dispatch(&engine, invocation, &flags).await;
    }

    match cli.command {
        Commands::Setup(args) => commands::setup::run(&engine, args, &flags).await,
        Commands::Check(args) => commands::check::run(&engine, args, &flags).await,
        Commands::Update(args) => commands::update::run(&engine, args, &flags).await,
        Commands::Context(args) => commands::context::run(&engine, args),
        Commands::Version(args) => commands::version::run(&engine, &args),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, silent: bool) {
    let filter = if silent {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
