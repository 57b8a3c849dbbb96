use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::app::Result;
use crate::domain::GameRecord;

/// All games of one scrape run, in discovery order.
///
/// Serializes as a JSON object keyed `"1"`..`"N"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    games: Vec<GameRecord>,
}

impl ResultSet {
    /// Concatenate per-tournament game lists, keeping tournament order and
    /// round order within each tournament.
    pub fn assemble<I>(per_tournament: I) -> Self
    where
        I: IntoIterator<Item = Vec<GameRecord>>,
    {
        Self {
            games: per_tournament.into_iter().flatten().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    /// Pairs of sequence key and record, keys starting at `"1"`.
    pub fn entries(&self) -> impl Iterator<Item = (String, &GameRecord)> {
        self.games
            .iter()
            .enumerate()
            .map(|(idx, game)| ((idx + 1).to_string(), game))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.games.len()))?;
        for (key, game) in self.entries() {
            map.serialize_entry(&key, game)?;
        }
        map.end()
    }
}
