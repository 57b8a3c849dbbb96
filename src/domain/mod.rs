pub mod game;
pub mod player;
pub mod result_set;
pub mod tournament;

pub use game::{Color, GameRecord, GameResult};
pub use player::PlayerId;
pub use result_set::ResultSet;
pub use tournament::TournamentReference;
