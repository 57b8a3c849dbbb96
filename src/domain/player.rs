use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::app::{CrosstableError, Result};

/// Federation id of a player, kept verbatim for URLs and output records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn parse(raw: &str) -> Result<Self> {
        let id = raw.trim();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(CrosstableError::InvalidPlayerId(raw.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Site-relative path of the player's profile page.
    pub fn profile_path(&self) -> String {
        format!("/player/{}", self.0)
    }

    /// File name used for persisted results of this player.
    pub fn output_file_name(&self) -> String {
        format!("chess-games-{}.json", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = CrosstableError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
