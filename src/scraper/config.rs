use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://ratings.uschess.org";
pub const DEFAULT_MAX_TOURNAMENTS: usize = 10;

/// Configuration for the ratings-site scraper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Ratings site root; player and event links are resolved against it
    pub base_url: String,

    /// Maximum number of distinct tournaments to visit (default: 10)
    pub max_tournaments: usize,

    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Player page load timeout in seconds (default: 30)
    pub player_page_timeout_secs: u64,

    /// How long to wait for tournament links on the player page (default: 10)
    pub player_selector_timeout_secs: u64,

    /// Tournament page load timeout in seconds (default: 20)
    pub event_page_timeout_secs: u64,

    /// How long to wait for the standings table on a tournament page (default: 5)
    pub event_selector_timeout_secs: u64,

    /// Interval between selector checks in milliseconds (default: 250)
    pub selector_poll_interval_ms: u64,

    /// User agent string to use
    pub user_agent: Option<String>,

    /// Explicit Chrome/Chromium binary; searched on PATH when unset
    pub chrome_executable: Option<PathBuf>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tournaments: DEFAULT_MAX_TOURNAMENTS,
            headless: true,
            player_page_timeout_secs: 30,
            player_selector_timeout_secs: 10,
            event_page_timeout_secs: 20,
            event_selector_timeout_secs: 5,
            selector_poll_interval_ms: 250,
            user_agent: None,
            chrome_executable: None,
        }
    }
}

impl ScraperConfig {
    pub fn player_page_timeout(&self) -> Duration {
        Duration::from_secs(self.player_page_timeout_secs)
    }

    pub fn player_selector_timeout(&self) -> Duration {
        Duration::from_secs(self.player_selector_timeout_secs)
    }

    pub fn event_page_timeout(&self) -> Duration {
        Duration::from_secs(self.event_page_timeout_secs)
    }

    pub fn event_selector_timeout(&self) -> Duration {
        Duration::from_secs(self.event_selector_timeout_secs)
    }

    pub fn selector_poll_interval(&self) -> Duration {
        Duration::from_millis(self.selector_poll_interval_ms)
    }
}
