use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserSummary;
use crate::game::Grid;

/// A published word search. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub word_list: Vec<String>,
    pub grid: Grid,
    /// Fixed at creation, never recomputed
    pub grid_size: usize,
    pub creator: UserSummary,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGame {
    pub title: String,
    pub description: Option<String>,
    pub word_list: Vec<String>,
    pub grid: Grid,
    pub created_by: i64,
}

/// A player's completion of a game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub id: i64,
    pub game_id: i64,
    pub player_name: String,
    /// Elapsed time as reported by the client
    pub time_token: i64,
    pub found_words: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGameResult {
    pub player_name: String,
    pub time_token: i64,
    pub found_words: Vec<String>,
}
