use serde::{Serialize, Serializer};

/// Outcome of a single game from the scraped player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GameResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
    #[serde(rename = "D")]
    Draw,
}

impl GameResult {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'W' => Some(Self::Win),
            'L' => Some(Self::Loss),
            'D' => Some(Self::Draw),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::Win => 'W',
            Self::Loss => 'L',
            Self::Draw => 'D',
        }
    }
}

/// Piece colour the scraped player had.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn marker(self) -> char {
        match self {
            Self::White => 'W',
            Self::Black => 'B',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
        }
    }
}

/// One played game. Every field is always serialized; unknown values are
/// written as empty strings so consumers see a fixed schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRecord {
    pub tournament_name: String,
    pub round: u32,
    pub result: GameResult,
    pub opponent_pairing_number: String,
    pub opponent_name: String,
    pub opponent_uscf_id: String,
    #[serde(serialize_with = "serialize_color")]
    pub color: Option<Color>,
    pub player_name: String,
    pub player_uscf_id: String,
}

fn serialize_color<S: Serializer>(color: &Option<Color>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(color.map(Color::name).unwrap_or(""))
}
