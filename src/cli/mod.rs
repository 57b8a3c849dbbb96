pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::domain::PlayerId;

#[derive(Parser)]
#[command(name = "crosstable")]
#[command(about = "Fetch a player's recent tournament games as JSON", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/crosstable/config.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Maximum number of tournaments to visit
    #[arg(short, long, global = true)]
    pub max_tournaments: Option<usize>,

    /// Show the browser window instead of running headless
    #[arg(long, global = true)]
    pub headful: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape one player and print the games as JSON
    Run {
        /// Federation id of the player
        player_id: PlayerId,

        /// Also write the JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Scrape several players, writing one JSON file each plus a summary
    Batch {
        /// Player ids, comma or space separated
        #[arg(value_delimiter = ',', required = true)]
        player_ids: Vec<PlayerId>,

        /// Directory for chess-games-<id>.json and summary.json
        #[arg(short, long, default_value = "outputs")]
        out_dir: PathBuf,
    },
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(max) = self.max_tournaments {
            config.scraper.max_tournaments = max;
        }
        if self.headful {
            config.scraper.headless = false;
        }
    }
}

#[derive(Parser)]
#[command(name = "trigger")]
#[command(about = "Run the scraper workflow on GitHub Actions", long_about = None)]
pub struct TriggerCli {
    /// Config file (default: ~/.config/crosstable/config.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Repository owner
    #[arg(long, global = true)]
    pub owner: Option<String>,

    /// Repository name
    #[arg(long, global = true)]
    pub repo: Option<String>,

    /// Workflow file name
    #[arg(long, global = true)]
    pub workflow: Option<String>,

    /// Git ref to run the workflow on
    #[arg(long = "ref", global = true)]
    pub git_ref: Option<String>,

    #[command(subcommand)]
    pub command: TriggerCommands,
}

#[derive(Subcommand)]
pub enum TriggerCommands {
    /// Dispatch the workflow for a player and print the run URL
    Run {
        /// Federation id of the player
        player_id: PlayerId,

        /// Keep polling until the run completes
        #[arg(short, long)]
        wait: bool,
    },
}

impl TriggerCli {
    pub fn apply(&self, config: &mut Config) {
        let trigger = &mut config.trigger;
        if let Some(ref owner) = self.owner {
            trigger.owner = owner.clone();
        }
        if let Some(ref repo) = self.repo {
            trigger.repo = repo.clone();
        }
        if let Some(ref workflow) = self.workflow {
            trigger.workflow = workflow.clone();
        }
        if let Some(ref git_ref) = self.git_ref {
            trigger.git_ref = git_ref.clone();
        }
    }
}
