/// A tournament listed on a player's profile page.
///
/// Identity is the resolved detail-page URL; two rows with the same name but
/// differently formatted links are treated as distinct events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentReference {
    pub name: String,
    pub url: String,
}

impl TournamentReference {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Shortened name for progress logging.
    pub fn short_name(&self) -> &str {
        match self.name.char_indices().nth(50) {
            Some((idx, _)) => &self.name[..idx],
            None => &self.name,
        }
    }
}
