//! Compact round-cell notation used in crosstables.
//!
//! A played round reads `[colour]RESULT PAIRING`, e.g. `W12`, `BL7` or
//! `⚪️D3`. The colour marker is optional and may be an ASCII `W`/`B` or one of
//! the site's circle glyphs. An ASCII marker only counts as colour when a
//! result letter follows it, so `W12` is a win with no colour while `WW12`
//! is a win as White. The site's standings carry colour in the glyph row,
//! which the extractor reads separately.
//!
//! Byes and unplayed rounds (`B`, `H`, `U`, `X`, `F`, `Z`, `-`, `BYE`, or an
//! empty cell) carry no opponent and yield no game.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::app::{CrosstableError, Result};
use crate::domain::{Color, GameResult};

static CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<color>[WB]|⚪\x{FE0F}?|⚫\x{FE0F}?)?\s*(?P<result>[WLD])\s*(?P<opponent>\d+)$",
    )
    .expect("valid cell notation regex")
});

static BYE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:bye|[bhuxfz-])?$").expect("valid bye regex"));

/// A decoded round cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellNotation {
    pub color: Option<Color>,
    pub result: GameResult,
    pub opponent: u32,
}

impl CellNotation {
    /// Canonical ASCII form, readable by [`parse_cell`].
    pub fn encode(&self) -> String {
        let mut out = String::new();
        if let Some(color) = self.color {
            out.push(color.marker());
        }
        out.push(self.result.letter());
        out.push_str(&self.opponent.to_string());
        out
    }
}

impl fmt::Display for CellNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Map a colour indicator (glyph or letter) to a colour.
pub fn parse_color(marker: &str) -> Option<Color> {
    match marker.trim().trim_end_matches('\u{FE0F}') {
        "⚪" | "W" | "w" => Some(Color::White),
        "⚫" | "B" | "b" => Some(Color::Black),
        _ => None,
    }
}

/// Parse one round cell.
///
/// Returns `Ok(None)` for byes and empty rounds, and a
/// [`CrosstableError::Parse`] when the text fits neither form.
pub fn parse_cell(text: &str) -> Result<Option<CellNotation>> {
    let text = text.trim();

    if BYE_RE.is_match(text) {
        return Ok(None);
    }

    let caps = CELL_RE
        .captures(text)
        .ok_or_else(|| CrosstableError::Parse(format!("unrecognised round cell {:?}", text)))?;

    let color = caps.name("color").and_then(|m| parse_color(m.as_str()));

    let result = caps
        .name("result")
        .and_then(|m| m.as_str().chars().next())
        .and_then(GameResult::from_letter)
        .ok_or_else(|| CrosstableError::Parse(format!("missing result in {:?}", text)))?;

    let opponent = caps["opponent"]
        .parse::<u32>()
        .map_err(|e| CrosstableError::Parse(format!("bad pairing number in {:?}: {}", text, e)))?;

    Ok(Some(CellNotation {
        color,
        result,
        opponent,
    }))
}
