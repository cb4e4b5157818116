use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::models::{Comment, Game, GameResult, NewGame, NewGameResult, NewUser, User};

pub mod memory;
pub mod queries;

pub use memory::MemoryStore;
pub use queries::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("email already registered")]
    DuplicateEmail,

    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),

    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Record store for users, games, results and comments.
///
/// Deleting a game also deletes its results and comments.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn get_user(&self, user_id: i64) -> StoreResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn create_game(&self, game: NewGame) -> StoreResult<Game>;
    /// Newest first
    async fn list_games(&self) -> StoreResult<Vec<Game>>;
    async fn get_game(&self, game_id: i64) -> StoreResult<Option<Game>>;
    async fn delete_game(&self, game_id: i64) -> StoreResult<bool>;

    async fn create_result(&self, game_id: i64, result: NewGameResult) -> StoreResult<GameResult>;
    /// Oldest first
    async fn list_results(&self, game_id: i64) -> StoreResult<Vec<GameResult>>;

    async fn create_comment(&self, game_id: i64, user_id: i64, content: &str)
        -> StoreResult<Comment>;
    /// Newest first
    async fn list_comments(&self, game_id: i64) -> StoreResult<Vec<Comment>>;
    async fn get_comment(&self, comment_id: i64) -> StoreResult<Option<Comment>>;
    async fn delete_comment(&self, comment_id: i64) -> StoreResult<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    NotAuthorized,
}

/// Delete a comment on behalf of a user. Allowed for the comment's author and
/// for the creator of the game it was posted on.
pub async fn delete_comment_as(
    store: &dyn Store,
    comment_id: i64,
    user_id: i64,
) -> StoreResult<DeleteOutcome> {
    let Some(comment) = store.get_comment(comment_id).await? else {
        return Ok(DeleteOutcome::NotFound);
    };

    let is_author = comment.user.id == user_id;
    let is_game_creator = match store.get_game(comment.game_id).await? {
        Some(game) => game.creator.id == user_id,
        None => false,
    };

    if !(is_author || is_game_creator) {
        return Ok(DeleteOutcome::NotAuthorized);
    }

    if store.delete_comment(comment_id).await? {
        Ok(DeleteOutcome::Deleted)
    } else {
        Ok(DeleteOutcome::NotFound)
    }
}

pub async fn create_pool(database_url: &str, max_connections: u32) -> sqlx::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
