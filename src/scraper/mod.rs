//! Scraping a player's tournament history from the ratings site.
//!
//! # Architecture
//!
//! ```text
//! PlayerId → Navigator → profile page → TournamentReference × N
//!                      → tournament page → GameExtractor → GameRecord × M
//!                      → ResultSet
//! ```
//!
//! Pages come from a [`PageSource`]. In production that is a
//! [`BrowserSession`] driving headless Chrome; tests use a
//! [`FixtureSource`] serving recorded HTML.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crosstable::scraper::{scrape_player, BrowserSession, ScraperConfig};
//!
//! let config = ScraperConfig::default();
//! let session = BrowserSession::launch(&config).await?;
//! let result = scrape_player(&session, &config, &player).await;
//! session.close().await;
//! println!("{}", result?.to_json_pretty()?);
//! ```

mod chrome;
mod config;
mod extractor;
mod fixture;
mod navigator;
pub mod notation;

pub use chrome::BrowserSession;
pub use config::{ScraperConfig, DEFAULT_BASE_URL, DEFAULT_MAX_TOURNAMENTS};
pub use extractor::{Extraction, GameExtractor, Opponent, STANDINGS_ROW_SELECTOR};
pub use fixture::FixtureSource;
pub use navigator::{parse_tournament_links, Navigator, EVENT_LINK_SELECTOR};

use std::time::Duration;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{PlayerId, ResultSet};

/// Something that can load pages and hand back their DOM
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Navigate to `url` and wait for it to load
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Wait until an element matching the CSS `selector` is present
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Serialized HTML of the current page
    async fn html(&self) -> Result<String>;
}

/// Scrape one player's recent games from `source`.
pub async fn scrape_player<S: PageSource + ?Sized>(
    source: &S,
    config: &ScraperConfig,
    player: &PlayerId,
) -> Result<ResultSet> {
    Navigator::new(source, config).collect_games(player).await
}
