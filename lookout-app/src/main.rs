use anyhow::Result;
use clap::{Parser, Subcommand};
use lookout_app::runner::{Mode, Runner};
use lookout_common::observability::{init_logging, LogConfig};
use lookout_config::ConfigLoader;

/// Search recent posts from configured X accounts and post a digest to a
/// Discord webhook.
#[derive(Parser)]
#[command(name = "lookout", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Search recent posts and deliver the digest (default)
    Run,
    /// Verify provider connectivity without searching or notifying
    Probe,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Env wins; a missing required variable fails before any network call.
    let config = ConfigLoader::new().load()?;
    init_logging(LogConfig::default())?;

    let mode = match cli.command {
        Some(Command::Probe) => Mode::Probe,
        _ => Mode::Run,
    };

    let runner = Runner::new(&config)?;
    let report = runner.execute(mode).await?;
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
