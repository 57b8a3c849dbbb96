use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crosstable::cli::{commands, Cli, Commands};
use crosstable::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    match cli.command {
        Commands::Run { player_id, output } => {
            commands::run_player(&config.scraper, &player_id, output.as_deref()).await?;
        }
        Commands::Batch {
            player_ids,
            out_dir,
        } => {
            let summary = commands::run_batch(&config.scraper, &player_ids, &out_dir).await?;
            if summary.failed() > 0 {
                anyhow::bail!("{} of {} players failed", summary.failed(), player_ids.len());
            }
        }
    }

    Ok(())
}
