use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crosstable::cli::{commands, TriggerCli, TriggerCommands};
use crosstable::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = TriggerCli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    match cli.command {
        TriggerCommands::Run { player_id, wait } => {
            commands::trigger_run(&config.trigger, &player_id, wait).await?;
        }
    }

    Ok(())
}
