use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};

use super::{Store, StoreError, StoreResult};
use crate::models::{Comment, Game, GameResult, NewGame, NewGameResult, NewUser, User};

/// Process-local store used when no database is configured, and by tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<i64, User>,
    /// email -> user id
    emails: DashMap<String, i64>,
    games: DashMap<i64, Game>,
    results: DashMap<i64, GameResult>,
    comments: DashMap<i64, Comment>,
    next_user_id: AtomicI64,
    next_game_id: AtomicI64,
    next_result_id: AtomicI64,
    next_comment_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn next_id(counter: &AtomicI64) -> i64 {
    counter.fetch_add(1, Ordering::Relaxed) + 1
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEmail),
            Entry::Vacant(slot) => {
                let record = User {
                    id: next_id(&self.next_user_id),
                    username: user.username,
                    email: user.email,
                    password_hash: user.password_hash,
                    created_at: Utc::now(),
                };
                self.users.insert(record.id, record.clone());
                slot.insert(record.id);
                Ok(record)
            }
        }
    }

    async fn get_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let Some(user_id) = self.emails.get(email).map(|id| *id) else {
            return Ok(None);
        };
        self.get_user(user_id).await
    }

    async fn create_game(&self, game: NewGame) -> StoreResult<Game> {
        let creator = self
            .users
            .get(&game.created_by)
            .map(|u| u.summary())
            .ok_or(StoreError::MissingReference("user"))?;

        let record = Game {
            id: next_id(&self.next_game_id),
            title: game.title,
            description: game.description,
            word_list: game.word_list,
            grid_size: game.grid.size(),
            grid: game.grid,
            creator,
            created_at: Utc::now(),
        };
        self.games.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_games(&self) -> StoreResult<Vec<Game>> {
        let mut games: Vec<Game> = self.games.iter().map(|g| g.clone()).collect();
        games.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(games)
    }

    async fn get_game(&self, game_id: i64) -> StoreResult<Option<Game>> {
        Ok(self.games.get(&game_id).map(|g| g.clone()))
    }

    async fn delete_game(&self, game_id: i64) -> StoreResult<bool> {
        if self.games.remove(&game_id).is_none() {
            return Ok(false);
        }
        self.results.retain(|_, r| r.game_id != game_id);
        self.comments.retain(|_, c| c.game_id != game_id);
        Ok(true)
    }

    async fn create_result(&self, game_id: i64, result: NewGameResult) -> StoreResult<GameResult> {
        if !self.games.contains_key(&game_id) {
            return Err(StoreError::MissingReference("game"));
        }

        let record = GameResult {
            id: next_id(&self.next_result_id),
            game_id,
            player_name: result.player_name,
            time_token: result.time_token,
            found_words: result.found_words,
            created_at: Utc::now(),
        };
        self.results.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_results(&self, game_id: i64) -> StoreResult<Vec<GameResult>> {
        let mut results: Vec<GameResult> = self
            .results
            .iter()
            .filter(|r| r.game_id == game_id)
            .map(|r| r.clone())
            .collect();
        results.sort_by_key(|r| r.id);
        Ok(results)
    }

    async fn create_comment(
        &self,
        game_id: i64,
        user_id: i64,
        content: &str,
    ) -> StoreResult<Comment> {
        if !self.games.contains_key(&game_id) {
            return Err(StoreError::MissingReference("game"));
        }
        let user = self
            .users
            .get(&user_id)
            .map(|u| u.summary())
            .ok_or(StoreError::MissingReference("user"))?;

        let record = Comment {
            id: next_id(&self.next_comment_id),
            content: content.to_string(),
            user,
            game_id,
            created_at: Utc::now(),
        };
        self.comments.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_comments(&self, game_id: i64) -> StoreResult<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.game_id == game_id)
            .map(|c| c.clone())
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(comments)
    }

    async fn get_comment(&self, comment_id: i64) -> StoreResult<Option<Comment>> {
        Ok(self.comments.get(&comment_id).map(|c| c.clone()))
    }

    async fn delete_comment(&self, comment_id: i64) -> StoreResult<bool> {
        Ok(self.comments.remove(&comment_id).is_some())
    }
}
