//! # Crosstable
//!
//! Fetches a chess player's recent tournament games from the US Chess
//! ratings site with a headless browser and prints them as JSON.
//!
//! ## Architecture
//!
//! ```text
//! BrowserSession → Navigator → GameExtractor → ResultSet → JSON
//! ```
//!
//! - [`scraper`]: page loading, tournament discovery and crosstable parsing
//! - [`domain`]: player ids, tournament references, game records
//! - [`trigger`]: starts the scraper workflow on GitHub Actions
//!
//! ## Quick Start
//!
//! ```bash
//! # Scrape one player
//! crosstable run 31979530
//!
//! # Scrape several players into outputs/
//! crosstable batch 30522189,16576086
//!
//! # Run the scrape in CI instead
//! GITHUB_TOKEN=... trigger run 31979530 --wait
//! ```

/// Error type shared by the library and both binaries.
pub mod app;

/// Command-line definitions and command handlers for both binaries.
pub mod cli;

/// Configuration loaded from `~/.config/crosstable/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`PlayerId`](domain::PlayerId): federation id
/// - [`TournamentReference`](domain::TournamentReference): event name and URL
/// - [`GameRecord`](domain::GameRecord): one played game
/// - [`ResultSet`](domain::ResultSet): numbered games of one run
pub mod domain;

/// Browser-driven scraping of player histories.
///
/// - [`PageSource`](scraper::PageSource): async trait for loading pages
/// - [`BrowserSession`](scraper::BrowserSession): headless Chrome via chromiumoxide
/// - [`FixtureSource`](scraper::FixtureSource): recorded pages for tests
/// - [`Navigator`](scraper::Navigator): profile → tournaments → games
pub mod scraper;

/// GitHub Actions workflow trigger with bounded polling.
pub mod trigger;
