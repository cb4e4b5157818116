use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};

use super::{Store, StoreError, StoreResult};
use crate::{
    game::Grid,
    models::{Comment, Game, GameResult, NewGame, NewGameResult, NewUser, User, UserSummary},
};

const GAME_COLUMNS: &str = r#"
    g.id, g.title, g.description, g.word_list, g.grid, g.grid_size,
    g.created_by, u.username AS creator_username, g.created_at
"#;

const COMMENT_COLUMNS: &str = r#"
    c.id, c.content, c.user_id, u.username AS author_username, c.game_id, c.created_at
"#;

#[derive(Debug, FromRow)]
struct GameRow {
    id: i64,
    title: String,
    description: Option<String>,
    word_list: Json<Vec<String>>,
    grid: Json<Vec<String>>,
    grid_size: i32,
    created_by: i64,
    creator_username: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<GameRow> for Game {
    type Error = StoreError;

    fn try_from(row: GameRow) -> Result<Self, Self::Error> {
        let grid = Grid::from_flat(&row.grid.0)
            .map_err(|e| StoreError::Corrupt(format!("game {} grid: {}", row.id, e)))?;

        Ok(Game {
            id: row.id,
            title: row.title,
            description: row.description,
            word_list: row.word_list.0,
            grid,
            grid_size: row.grid_size as usize,
            creator: UserSummary {
                id: row.created_by,
                username: row.creator_username,
            },
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ResultRow {
    id: i64,
    game_id: i64,
    player_name: String,
    time_token: i64,
    found_words: Json<Vec<String>>,
    created_at: DateTime<Utc>,
}

impl From<ResultRow> for GameResult {
    fn from(row: ResultRow) -> Self {
        GameResult {
            id: row.id,
            game_id: row.game_id,
            player_name: row.player_name,
            time_token: row.time_token,
            found_words: row.found_words.0,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: i64,
    content: String,
    user_id: i64,
    author_username: String,
    game_id: i64,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            content: row.content,
            user: UserSummary {
                id: row.user_id,
                username: row.author_username,
            },
            game_id: row.game_id,
            created_at: row.created_at,
        }
    }
}

/// Map foreign key violations onto the record that was missing
fn missing_reference(err: sqlx::Error, what: &'static str) -> StoreError {
    match err {
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            StoreError::MissingReference(what)
        }
        other => StoreError::Database(other),
    }
}

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl Store for PgStore {
    // User queries
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            other => StoreError::Database(other),
        })
    }

    async fn get_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    // Game queries
    async fn create_game(&self, game: NewGame) -> StoreResult<Game> {
        let sql = format!(
            r#"
            WITH g AS (
                INSERT INTO games (title, description, word_list, grid, grid_size, created_by)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT {GAME_COLUMNS}
            FROM g JOIN users u ON u.id = g.created_by
            "#
        );

        let row = sqlx::query_as::<_, GameRow>(&sql)
            .bind(&game.title)
            .bind(&game.description)
            .bind(Json(&game.word_list))
            .bind(Json(game.grid.to_flat()))
            .bind(game.grid.size() as i32)
            .bind(game.created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| missing_reference(e, "user"))?;

        row.try_into()
    }

    async fn list_games(&self) -> StoreResult<Vec<Game>> {
        let sql = format!(
            r#"
            SELECT {GAME_COLUMNS}
            FROM games g JOIN users u ON u.id = g.created_by
            ORDER BY g.created_at DESC, g.id DESC
            "#
        );

        sqlx::query_as::<_, GameRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Game::try_from)
            .collect()
    }

    async fn get_game(&self, game_id: i64) -> StoreResult<Option<Game>> {
        let sql = format!(
            r#"
            SELECT {GAME_COLUMNS}
            FROM games g JOIN users u ON u.id = g.created_by
            WHERE g.id = $1
            "#
        );

        sqlx::query_as::<_, GameRow>(&sql)
            .bind(game_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Game::try_from)
            .transpose()
    }

    async fn delete_game(&self, game_id: i64) -> StoreResult<bool> {
        // results and comments go with it via ON DELETE CASCADE
        let deleted = sqlx::query("DELETE FROM games WHERE id = $1")
            .bind(game_id)
            .execute(&self.pool)
            .await?;
        Ok(deleted.rows_affected() > 0)
    }

    // Result queries
    async fn create_result(&self, game_id: i64, result: NewGameResult) -> StoreResult<GameResult> {
        let row = sqlx::query_as::<_, ResultRow>(
            r#"
            INSERT INTO results (game_id, player_name, time_token, found_words)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(game_id)
        .bind(&result.player_name)
        .bind(result.time_token)
        .bind(Json(&result.found_words))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_reference(e, "game"))?;

        Ok(row.into())
    }

    async fn list_results(&self, game_id: i64) -> StoreResult<Vec<GameResult>> {
        let rows = sqlx::query_as::<_, ResultRow>(
            "SELECT * FROM results WHERE game_id = $1 ORDER BY id",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(GameResult::from).collect())
    }

    // Comment queries
    async fn create_comment(
        &self,
        game_id: i64,
        user_id: i64,
        content: &str,
    ) -> StoreResult<Comment> {
        let sql = format!(
            r#"
            WITH c AS (
                INSERT INTO comments (content, user_id, game_id)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT {COMMENT_COLUMNS}
            FROM c JOIN users u ON u.id = c.user_id
            "#
        );

        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(content)
            .bind(user_id)
            .bind(game_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| missing_reference(e, "game"))?;

        Ok(row.into())
    }

    async fn list_comments(&self, game_id: i64) -> StoreResult<Vec<Comment>> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c JOIN users u ON u.id = c.user_id
            WHERE c.game_id = $1
            ORDER BY c.created_at DESC, c.id DESC
            "#
        );

        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(game_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn get_comment(&self, comment_id: i64) -> StoreResult<Option<Comment>> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c JOIN users u ON u.id = c.user_id
            WHERE c.id = $1
            "#
        );

        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Comment::from))
    }

    async fn delete_comment(&self, comment_id: i64) -> StoreResult<bool> {
        let deleted = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(deleted.rows_affected() > 0)
    }
}
