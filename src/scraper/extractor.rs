use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::app::{CrosstableError, Result};
use crate::domain::{GameRecord, PlayerId, TournamentReference};
use crate::scraper::notation::{parse_cell, parse_color, CellNotation};

/// One row per participant in a tournament's standings table.
pub const STANDINGS_ROW_SELECTOR: &str = r#"tr[class~="group/tr"]"#;

const NAME_SELECTOR: &str = "div.font-names";
const PLAYER_LINK_SELECTOR: &str = r#"a[href^="/player/"]"#;
const GRID_SELECTOR: &str = "div.grid-rows-2";

/// Columns before the first round: pairing number, player, rating.
const LEADING_COLUMNS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Opponent {
    pub name: String,
    pub id: String,
}

/// Everything recovered from one tournament page for the target player.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub player_name: String,
    pub games: Vec<GameRecord>,
    pub skipped_cells: usize,
    pub unresolved_opponents: usize,
}

/// Parses crosstable pages into game records
pub struct GameExtractor {
    row: Selector,
    name: Selector,
    player_link: Selector,
    grid: Selector,
    td: Selector,
    div: Selector,
}

impl Default for GameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl GameExtractor {
    pub fn new() -> Self {
        Self {
            row: static_selector(STANDINGS_ROW_SELECTOR),
            name: static_selector(NAME_SELECTOR),
            player_link: static_selector(PLAYER_LINK_SELECTOR),
            grid: static_selector(GRID_SELECTOR),
            td: static_selector("td"),
            div: static_selector("div"),
        }
    }

    /// Games the player played in this tournament, in round order.
    ///
    /// Empty when the player has no row on the page.
    pub fn extract_games(
        &self,
        html: &str,
        tournament: &TournamentReference,
        player: &PlayerId,
    ) -> Result<Vec<GameRecord>> {
        Ok(self
            .extract(html, tournament, player)?
            .map(|extraction| extraction.games)
            .unwrap_or_default())
    }

    /// Like [`extract_games`](Self::extract_games) but also reports the
    /// player's name and how many cells were dropped. `None` when the page
    /// has no row for the player.
    pub fn extract(
        &self,
        html: &str,
        tournament: &TournamentReference,
        player: &PlayerId,
    ) -> Result<Option<Extraction>> {
        let document = Html::parse_document(html);
        let own_link = Selector::parse(&format!(r#"a[href="{}"]"#, player.profile_path()))
            .map_err(|e| CrosstableError::Parse(format!("bad player selector: {}", e)))?;

        let Some(player_row) = document
            .select(&self.row)
            .find(|row| row.select(&own_link).next().is_some())
        else {
            return Ok(None);
        };

        let pairings = self.pairing_table(&document);
        let player_name = player_row
            .select(&self.name)
            .next()
            .map(inner_text)
            .unwrap_or_default();

        let mut extraction = Extraction {
            player_name: player_name.clone(),
            ..Default::default()
        };

        for (idx, cell) in round_cells(player_row.select(&self.td).collect())
            .into_iter()
            .enumerate()
        {
            let round = idx as u32 + 1;
            let notation = match self.read_cell(cell) {
                Ok(Some(notation)) => notation,
                Ok(None) => continue,
                Err(e) => {
                    debug!(round, error = %e, "skipping round cell");
                    extraction.skipped_cells += 1;
                    continue;
                }
            };

            let opponent = match pairings.get(&notation.opponent) {
                Some(opponent) => opponent.clone(),
                None => {
                    debug!(round, pairing = notation.opponent, "opponent not in pairing list");
                    extraction.unresolved_opponents += 1;
                    Opponent::default()
                }
            };

            extraction.games.push(GameRecord {
                tournament_name: tournament.name.clone(),
                round,
                result: notation.result,
                opponent_pairing_number: notation.opponent.to_string(),
                opponent_name: opponent.name,
                opponent_uscf_id: opponent.id,
                color: notation.color,
                player_name: player_name.clone(),
                player_uscf_id: player.to_string(),
            });
        }

        Ok(Some(extraction))
    }

    /// Pairing number → opponent, built from every standings row.
    pub fn pairing_table(&self, document: &Html) -> HashMap<u32, Opponent> {
        let mut table = HashMap::new();

        for row in document.select(&self.row) {
            let Some(number) = self.pairing_number(row) else {
                continue;
            };

            let name = row
                .select(&self.name)
                .next()
                .map(inner_text)
                .unwrap_or_default();
            let id = row
                .select(&self.player_link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| href.trim_end_matches('/').rsplit('/').next())
                .unwrap_or_default()
                .to_string();

            table.insert(number, Opponent { name, id });
        }

        table
    }

    fn pairing_number(&self, row: ElementRef<'_>) -> Option<u32> {
        let first_td = row.select(&self.td).next()?;
        let grid = first_descendant(first_td, &self.grid)?;
        let outer = first_descendant(grid, &self.div)?;
        let inner = first_descendant(outer, &self.div)?;
        inner_text(inner).parse().ok()
    }

    /// Decode a round cell. The site renders result and opponent in the top
    /// half of a two-row grid and the colour glyph in the bottom half; cells
    /// without that grid are read as plain notation text.
    fn read_cell(&self, cell: ElementRef<'_>) -> Result<Option<CellNotation>> {
        let Some(grid) = first_descendant(cell, &self.grid) else {
            return parse_cell(&inner_text(cell));
        };

        let halves = child_divs(grid);
        let (Some(top), Some(bottom)) = (halves.first(), halves.get(1)) else {
            return Ok(None);
        };

        let top = child_divs(*top);
        let result = top.first().map(|e| inner_text(*e)).unwrap_or_default();
        let opponent = top.get(1).map(|e| inner_text(*e)).unwrap_or_default();
        let glyph = child_divs(*bottom)
            .first()
            .map(|e| inner_text(*e))
            .unwrap_or_default();

        let notation = parse_cell(&format!("{}{}", result, opponent))?;
        Ok(notation.map(|n| CellNotation {
            color: n.color.or_else(|| parse_color(&glyph)),
            ..n
        }))
    }
}

fn static_selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid static selector")
}

/// Round columns sit between the leading columns and a trailing total column.
fn round_cells(tds: Vec<ElementRef<'_>>) -> Vec<ElementRef<'_>> {
    match tds.len() {
        n if n > LEADING_COLUMNS + 1 => tds[LEADING_COLUMNS..n - 1].to_vec(),
        n if n > LEADING_COLUMNS => tds[LEADING_COLUMNS..].to_vec(),
        _ => Vec::new(),
    }
}

/// First element below `el` (excluding `el` itself) matching `selector`.
fn first_descendant<'a>(el: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|e| selector.matches(e))
}

fn child_divs(el: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "div")
        .collect()
}

fn inner_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}
