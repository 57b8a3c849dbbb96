use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::{info, warn};

use crate::app::{CrosstableError, Result};
use crate::domain::{PlayerId, ResultSet};
use crate::scraper::{scrape_player, BrowserSession, PageSource, ScraperConfig};
use crate::trigger::{GithubApi, TriggerConfig, WorkflowTrigger};

/// Scrape one player with a fresh browser and print the JSON to stdout.
pub async fn run_player(config: &ScraperConfig, player: &PlayerId, output: Option<&Path>) -> Result<()> {
    let session = BrowserSession::launch(config).await?;
    let result = scrape_player(&session, config, player).await;
    session.close().await;

    let json = result?.to_json_pretty()?;
    println!("{}", json);

    if let Some(path) = output {
        fs::write(path, format!("{}\n", json))?;
        info!("Wrote {}", path.display());
    }

    Ok(())
}

/// Outcome of scraping one player in a batch.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Games(ResultSet),
    Failed { error: String, player_id: String },
}

/// Per-player results of a batch, in the order the ids were given.
#[derive(Debug, Default)]
pub struct BatchSummary {
    entries: Vec<(PlayerId, BatchEntry)>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, entry)| matches!(entry, BatchEntry::Failed { .. }))
            .count()
    }

    pub fn succeeded(&self) -> usize {
        self.entries.len() - self.failed()
    }
}

impl Serialize for BatchSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (player, entry) in &self.entries {
            map.serialize_entry(player.as_str(), entry)?;
        }
        map.end()
    }
}

/// Scrape several players with one browser, writing a file per player and
/// `summary.json` into `out_dir`. Repeated ids are scraped once.
pub async fn run_batch(config: &ScraperConfig, players: &[PlayerId], out_dir: &Path) -> Result<BatchSummary> {
    fs::create_dir_all(out_dir)?;

    let session = BrowserSession::launch(config).await?;
    let summary = scrape_batch(&session, config, players, out_dir).await;
    session.close().await;

    let summary = summary?;
    println!(
        "Processed {} players: {} succeeded, {} failed. Files saved in {}",
        summary.entries.len(),
        summary.succeeded(),
        summary.failed(),
        out_dir.display()
    );
    Ok(summary)
}

pub async fn scrape_batch<S: PageSource + ?Sized>(
    source: &S,
    config: &ScraperConfig,
    players: &[PlayerId],
    out_dir: &Path,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    let mut seen = HashSet::new();
    let players: Vec<&PlayerId> = players.iter().filter(|p| seen.insert(p.as_str())).collect();

    for (idx, player) in players.iter().copied().enumerate() {
        info!("Processing player {}/{}: {}", idx + 1, players.len(), player);

        let entry = match scrape_player(source, config, player).await {
            Ok(games) => BatchEntry::Games(games),
            Err(e) => {
                warn!(player = %player, "Scrape failed: {}", e);
                BatchEntry::Failed {
                    error: format!("Failed to scrape games for player ID {}: {}", player, e),
                    player_id: player.to_string(),
                }
            }
        };

        let path = out_dir.join(player.output_file_name());
        fs::write(&path, format!("{}\n", serde_json::to_string_pretty(&entry)?))?;
        summary.entries.push((player.clone(), entry));
    }

    let summary_path = out_dir.join("summary.json");
    fs::write(&summary_path, format!("{}\n", serde_json::to_string_pretty(&summary)?))?;
    info!("Summary saved to: {}", summary_path.display());

    Ok(summary)
}

/// Dispatch the scraper workflow and print the run URL.
///
/// With `wait`, polls until the run finishes. The outcome of the run is
/// reported but does not fail the command.
pub async fn trigger_run(config: &TriggerConfig, player: &PlayerId, wait: bool) -> Result<()> {
    let api = GithubApi::from_env(config.clone())?;
    let trigger = WorkflowTrigger::new(api, config.poll_policy());

    let handle = trigger.trigger(player).await?;
    println!("{}", handle.url);

    if wait {
        match trigger.poll(&handle).await {
            Ok(status) => info!(run_id = handle.id, "Run finished: {}", status),
            Err(CrosstableError::Timeout(msg)) => warn!("Stopped waiting: {}", msg),
            Err(e) => warn!("Could not follow run {}: {}", handle.id, e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::{FixtureSource, DEFAULT_BASE_URL};

    fn profile_with_one_event() -> &'static str {
        r#"<html><body><a href="/event/1">Club Night</a></body></html>"#
    }

    fn event_page(player: &str) -> String {
        format!(
            r#"<table>
<tr class="group/tr"><td><div class="grid-rows-2"><div><div>1</div></div></div></td><td><a href="/player/{player}"><div class="font-names">Doe, Jane</div></a></td><td>1200</td><td>WW2</td><td>0</td></tr>
<tr class="group/tr"><td><div class="grid-rows-2"><div><div>2</div></div></div></td><td><a href="/player/20000002"><div class="font-names">Roe, Rick</div></a></td><td>1100</td><td>BL1</td><td>0</td></tr>
</table>"#
        )
    }

    #[tokio::test]
    async fn test_batch_writes_files_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let source = FixtureSource::new()
            .with_page(format!("{DEFAULT_BASE_URL}/player/111"), profile_with_one_event())
            .with_page(format!("{DEFAULT_BASE_URL}/event/1"), event_page("111"));
        let players = vec![PlayerId::parse("111").unwrap(), PlayerId::parse("222").unwrap()];

        let summary = scrape_batch(&source, &ScraperConfig::default(), &players, dir.path())
            .await
            .unwrap();

        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);

        let games: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("chess-games-111.json")).unwrap())
                .unwrap();
        assert_eq!(games["1"]["opponent_name"], "Roe, Rick");
        assert_eq!(games["1"]["color"], "White");

        let failed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("chess-games-222.json")).unwrap())
                .unwrap();
        assert_eq!(failed["player_id"], "222");
        assert!(failed["error"].as_str().unwrap().contains("222"));

        let all: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
        assert_eq!(all["111"], games);
        assert_eq!(all["222"], failed);
    }

    #[tokio::test]
    async fn test_empty_history_still_writes_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let source = FixtureSource::new()
            .with_page(format!("{DEFAULT_BASE_URL}/player/333"), "<html><body></body></html>");
        let players = vec![PlayerId::parse("333").unwrap()];

        let summary = scrape_batch(&source, &ScraperConfig::default(), &players, dir.path())
            .await
            .unwrap();

        assert_eq!(summary.failed(), 0);
        let content = fs::read_to_string(dir.path().join("chess-games-333.json")).unwrap();
        assert_eq!(content.trim(), "{}");
    }

    #[tokio::test]
    async fn test_batch_scrapes_repeated_id_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = FixtureSource::new()
            .with_page(format!("{DEFAULT_BASE_URL}/player/111"), profile_with_one_event())
            .with_page(format!("{DEFAULT_BASE_URL}/event/1"), event_page("111"));
        let players = vec![PlayerId::parse("111").unwrap(), PlayerId::parse("111").unwrap()];

        let summary = scrape_batch(&source, &ScraperConfig::default(), &players, dir.path())
            .await
            .unwrap();

        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 0);
        assert_eq!(
            source.visits(),
            vec![
                format!("{DEFAULT_BASE_URL}/player/111"),
                format!("{DEFAULT_BASE_URL}/event/1"),
            ]
        );

        let content = fs::read_to_string(dir.path().join("summary.json")).unwrap();
        assert_eq!(content.matches("\"111\": {").count(), 1);
    }

    #[test]
    fn test_summary_keeps_input_order() {
        let summary = BatchSummary {
            entries: vec![
                (PlayerId::parse("9").unwrap(), BatchEntry::Games(ResultSet::default())),
                (
                    PlayerId::parse("10").unwrap(),
                    BatchEntry::Failed {
                        error: "boom".into(),
                        player_id: "10".into(),
                    },
                ),
            ],
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(
            json,
            r#"{"9":{},"10":{"error":"boom","player_id":"10"}}"#
        );
    }
}
