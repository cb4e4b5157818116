use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    /// Author of the comment
    pub user: UserSummary,
    pub game_id: i64,
    pub created_at: DateTime<Utc>,
}
