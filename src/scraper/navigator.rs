use std::collections::HashSet;

use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::app::{CrosstableError, Result};
use crate::domain::{PlayerId, ResultSet, TournamentReference};
use crate::scraper::config::ScraperConfig;
use crate::scraper::extractor::{Extraction, GameExtractor, STANDINGS_ROW_SELECTOR};
use crate::scraper::PageSource;

/// Tournament links on a player's profile page.
pub const EVENT_LINK_SELECTOR: &str = r#"a[href^="/event/"]"#;

/// Walks a player's profile and the tournaments it lists, one page at a time.
pub struct Navigator<'a, S: PageSource + ?Sized> {
    source: &'a S,
    config: &'a ScraperConfig,
    extractor: GameExtractor,
}

impl<'a, S: PageSource + ?Sized> Navigator<'a, S> {
    pub fn new(source: &'a S, config: &'a ScraperConfig) -> Self {
        Self {
            source,
            config,
            extractor: GameExtractor::new(),
        }
    }

    fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.config.base_url)?)
    }

    pub fn player_url(&self, player: &PlayerId) -> Result<Url> {
        Ok(self.base_url()?.join(&player.profile_path())?)
    }

    /// Distinct tournaments from the player's history, most recent first,
    /// at most `max_tournaments` of them.
    ///
    /// Failing to load the profile page is an error. A profile that loads but
    /// never shows tournament links yields an empty list.
    pub async fn find_recent_tournaments(
        &self,
        player: &PlayerId,
    ) -> Result<Vec<TournamentReference>> {
        let url = self.player_url(player)?;
        info!("Loading player page: {}", url);

        self.source
            .goto(url.as_str(), self.config.player_page_timeout())
            .await?;

        if let Err(e) = self
            .source
            .wait_for_selector(EVENT_LINK_SELECTOR, self.config.player_selector_timeout())
            .await
        {
            warn!(player = %player, "No tournaments found on the player page: {}", e);
            return Ok(Vec::new());
        }

        let html = self.source.html().await?;
        parse_tournament_links(&html, &self.base_url()?, self.config.max_tournaments)
    }

    /// Load one tournament page and extract the player's games.
    pub async fn tournament_games(
        &self,
        tournament: &TournamentReference,
        player: &PlayerId,
    ) -> Result<Option<Extraction>> {
        self.source
            .goto(&tournament.url, self.config.event_page_timeout())
            .await?;
        self.source
            .wait_for_selector(STANDINGS_ROW_SELECTOR, self.config.event_selector_timeout())
            .await
            .map_err(|e| CrosstableError::navigation(&tournament.url, e))?;

        let html = self.source.html().await?;
        self.extractor.extract(&html, tournament, player)
    }

    /// Scrape every recent tournament and assemble the player's games.
    ///
    /// Tournaments that fail to load or have no row for the player are
    /// skipped; only a failure on the profile page aborts the run.
    pub async fn collect_games(&self, player: &PlayerId) -> Result<ResultSet> {
        let tournaments = self.find_recent_tournaments(player).await?;
        info!(
            player = %player,
            "Found {} tournaments. Processing up to {}",
            tournaments.len(),
            self.config.max_tournaments
        );

        let total = tournaments.len();
        let mut per_tournament = Vec::with_capacity(total);
        let mut games_so_far = 0;

        for (idx, tournament) in tournaments.iter().enumerate() {
            info!(
                "Processing tournament {}/{} (games: {}): {}",
                idx + 1,
                total,
                games_so_far,
                tournament.short_name()
            );

            match self.tournament_games(tournament, player).await {
                Ok(Some(extraction)) => {
                    if extraction.skipped_cells > 0 || extraction.unresolved_opponents > 0 {
                        debug!(
                            tournament = %tournament.name,
                            skipped = extraction.skipped_cells,
                            unresolved = extraction.unresolved_opponents,
                            "partially parsed tournament"
                        );
                    }
                    if extraction.games.is_empty() {
                        warn!(tournament = %tournament.name, "No games for player, skipping");
                        continue;
                    }
                    games_so_far += extraction.games.len();
                    per_tournament.push(extraction.games);
                }
                Ok(None) => {
                    warn!(tournament = %tournament.name, "Player not in standings, skipping");
                }
                Err(e) => {
                    warn!(tournament = %tournament.name, "Skipping tournament: {}", e);
                }
            }
        }

        let result = ResultSet::assemble(per_tournament);
        info!(player = %player, games = result.len(), "scrape complete");
        Ok(result)
    }
}

/// Tournament links in page order, deduplicated by resolved URL before
/// truncating to `max`.
pub fn parse_tournament_links(
    html: &str,
    base: &Url,
    max: usize,
) -> Result<Vec<TournamentReference>> {
    let document = Html::parse_document(html);
    let links = Selector::parse(EVENT_LINK_SELECTOR)
        .map_err(|e| CrosstableError::Parse(format!("bad event selector: {}", e)))?;

    let mut seen = HashSet::new();
    let mut tournaments = Vec::new();

    for link in document.select(&links) {
        if tournaments.len() >= max {
            break;
        }
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let url = base.join(href)?.to_string();
        if !seen.insert(url.clone()) {
            continue;
        }
        let name = link
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        tournaments.push(TournamentReference::new(name, url));
    }

    Ok(tournaments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GameResult;
    use crate::scraper::extractor::tests::{event_page, standings_row};
    use crate::scraper::FixtureSource;

    const BASE: &str = "https://ratings.uschess.org";
    const PLAYER: &str = "31979530";

    fn player() -> PlayerId {
        PlayerId::parse(PLAYER).unwrap()
    }

    fn profile(events: &[(&str, &str)]) -> String {
        let links: String = events
            .iter()
            .map(|(href, name)| format!(r#"<tr><td><a href="{href}">{name}</a></td></tr>"#))
            .collect();
        format!("<html><body><table>{links}</table></body></html>")
    }

    fn event_with_one_game(opponent: &str) -> String {
        event_page(&[
            standings_row(1, "Doe, Jane", PLAYER, &[Some(("W", "2", "⚪️"))]),
            standings_row(2, opponent, "22222222", &[Some(("L", "1", "⚫️"))]),
        ])
    }

    #[test]
    fn test_links_resolved_and_deduplicated() {
        let html = profile(&[
            ("/event/2024A", "Spring  Open"),
            ("/event/2024B", "Summer Open"),
            ("/event/2024A", "Spring Open"),
            ("https://ratings.uschess.org/event/2024B", "Summer Open"),
        ]);
        let base = Url::parse(BASE).unwrap();

        let refs = parse_tournament_links(&html, &base, 10).unwrap();
        assert_eq!(
            refs,
            vec![
                TournamentReference::new("Spring Open", "https://ratings.uschess.org/event/2024A"),
                TournamentReference::new("Summer Open", "https://ratings.uschess.org/event/2024B"),
            ]
        );
    }

    #[test]
    fn test_links_bounded_by_max_after_dedup() {
        let mut events = Vec::new();
        for n in 0..15 {
            let href = format!("/event/{}", n);
            events.push((href.clone(), format!("Event {}", n)));
            events.push((href, format!("Event {}", n)));
        }
        let borrowed: Vec<(&str, &str)> = events.iter().map(|(h, n)| (h.as_str(), n.as_str())).collect();
        let base = Url::parse(BASE).unwrap();

        let refs = parse_tournament_links(&profile(&borrowed), &base, 10).unwrap();
        assert_eq!(refs.len(), 10);
        let unique: HashSet<_> = refs.iter().map(|r| (&r.name, &r.url)).collect();
        assert_eq!(unique.len(), 10);
        assert_eq!(refs[9].name, "Event 9");
    }

    #[test]
    fn test_non_event_links_ignored() {
        let html = r#"<a href="/player/1">Me</a><a href="/events">All</a><a href="/event/7">Seven</a>"#;
        let base = Url::parse(BASE).unwrap();
        let refs = parse_tournament_links(html, &base, 10).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].url, "https://ratings.uschess.org/event/7");
    }

    #[tokio::test]
    async fn test_failed_tournament_is_skipped() {
        let source = FixtureSource::new()
            .with_page(
                format!("{BASE}/player/{PLAYER}"),
                profile(&[("/event/1", "First"), ("/event/2", "Broken"), ("/event/3", "Third")]),
            )
            .with_page(format!("{BASE}/event/1"), event_with_one_game("Alpha, A"))
            .with_page(format!("{BASE}/event/3"), event_with_one_game("Gamma, G"));
        let config = ScraperConfig::default();

        let result = Navigator::new(&source, &config)
            .collect_games(&player())
            .await
            .unwrap();

        let tournaments: Vec<_> = result.games().iter().map(|g| g.tournament_name.as_str()).collect();
        assert_eq!(tournaments, vec!["First", "Third"]);
        assert_eq!(result.games()[1].opponent_name, "Gamma, G");
        assert_eq!(source.visits().len(), 4);
    }

    #[tokio::test]
    async fn test_tournament_without_player_row_is_skipped() {
        let source = FixtureSource::new()
            .with_page(format!("{BASE}/player/{PLAYER}"), profile(&[("/event/1", "Other")]))
            .with_page(
                format!("{BASE}/event/1"),
                event_page(&[standings_row(1, "Someone", "99999999", &[])]),
            );
        let config = ScraperConfig::default();

        let result = Navigator::new(&source, &config)
            .collect_games(&player())
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_profile_without_tournaments_is_empty() {
        let source = FixtureSource::new().with_page(
            format!("{BASE}/player/{PLAYER}"),
            "<html><body>No rated events</body></html>",
        );
        let config = ScraperConfig::default();

        let result = Navigator::new(&source, &config)
            .collect_games(&player())
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(source.visits().len(), 1);
    }

    #[tokio::test]
    async fn test_profile_load_failure_is_fatal() {
        let source = FixtureSource::new();
        let config = ScraperConfig::default();

        let err = Navigator::new(&source, &config)
            .collect_games(&player())
            .await
            .unwrap_err();
        assert!(matches!(err, CrosstableError::Navigation { .. }));
    }

    #[tokio::test]
    async fn test_games_follow_discovery_order() {
        let source = FixtureSource::new()
            .with_page(
                format!("{BASE}/player/{PLAYER}"),
                profile(&[("/event/new", "Newer"), ("/event/old", "Older")]),
            )
            .with_page(
                format!("{BASE}/event/new"),
                event_page(&[
                    standings_row(1, "Doe, Jane", PLAYER, &[Some(("W", "2", "⚪️")), Some(("D", "2", "⚫️"))]),
                    standings_row(2, "Roe, Rick", "22222222", &[]),
                ]),
            )
            .with_page(format!("{BASE}/event/old"), event_with_one_game("Poe, Pat"));
        let config = ScraperConfig::default();

        let result = Navigator::new(&source, &config)
            .collect_games(&player())
            .await
            .unwrap();

        let order: Vec<_> = result
            .games()
            .iter()
            .map(|g| (g.tournament_name.as_str(), g.round, g.result))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Newer", 1, GameResult::Win),
                ("Newer", 2, GameResult::Draw),
                ("Older", 1, GameResult::Win),
            ]
        );
    }
}
