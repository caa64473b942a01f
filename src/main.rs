mod echo;
mod repl;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncWriteExt, BufReader};
use vigil_core::{Config, QueryGateway};
use vigil_tools::DryRunExecutor;

use crate::echo::EchoProvider;

/// Query-intent gateway: routes questions to LLM providers and gates
/// recognised commands behind a timed privilege session.
#[derive(Debug, Parser)]
#[command(name = "vigil", version)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "VIGIL_CONFIG", default_value = "config/default.toml")]
    config: PathBuf,

    /// Handle a single input, print the reply, and exit.
    #[arg(long)]
    once: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", cli.config.display()))?;
    tracing::info!(path = %cli.config.display(), "config loaded");

    let gateway = QueryGateway::new(&config, EchoProvider, DryRunExecutor)?;
    let mut stdout = tokio::io::stdout();

    if let Some(text) = cli.once {
        let reply = gateway.handle(&text).await?;
        stdout.write_all(format!("{reply}\n").as_bytes()).await?;
        stdout.flush().await?;
        return Ok(());
    }

    repl::run(&gateway, BufReader::new(tokio::io::stdin()), &mut stdout).await?;
    tracing::info!("shutting down");
    Ok(())
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
