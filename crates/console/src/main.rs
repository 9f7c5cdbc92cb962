use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use jinkops_console::cli::{self, Cli, StderrNotifier};
use jinkops_console::{Console, ConsoleConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    jinkops_observability::init();

    let args = Cli::parse();
    let config = args.apply(ConsoleConfig::from_env().context("invalid configuration")?);
    tracing::debug!(api = %config.api_base_url, session_file = ?config.session_file, "starting");

    let console = Console::new(config, Arc::new(StderrNotifier)).context("failed to start console")?;

    let mut stdout = std::io::stdout().lock();
    cli::run(&console, args.command, args.json, &mut stdout).await
}
