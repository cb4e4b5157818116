use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::GameResult;

/// Messages pushed from server to live viewers of a game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Subscribed {
        game_id: i64,
    },
    ResultPosted {
        result_id: i64,
        game_id: i64,
        player_name: String,
        time_token: i64,
        found_words: Vec<String>,
        created_at: DateTime<Utc>,
    },
}

impl From<&GameResult> for ServerMessage {
    fn from(result: &GameResult) -> Self {
        ServerMessage::ResultPosted {
            result_id: result.id,
            game_id: result.game_id,
            player_name: result.player_name.clone(),
            time_token: result.time_token,
            found_words: result.found_words.clone(),
            created_at: result.created_at,
        }
    }
}
