use crate::{
    auth::AuthenticatedUser,
    error::ApiError,
    models::{Game, NewGame},
    utils::letters::{is_grid_word, normalize_words},
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub word_list: Vec<String>,
}

/// Create a game, laying its words into a fresh grid.
///
/// Nothing is stored when a word cannot be placed.
pub async fn create_game(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateGameRequest>,
) -> Result<Json<Game>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    let word_list = normalize_words(&payload.word_list);
    if word_list.is_empty() || word_list.iter().any(|w| w.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "Word list must contain at least one non-empty word".to_string(),
        ));
    }
    if let Some(word) = word_list.iter().find(|w| !is_grid_word(w)) {
        return Err(ApiError::BadRequest(format!(
            "Word '{}' may only contain the letters A-Z",
            word
        )));
    }

    let grid = {
        let mut rng = rand::rng();
        state.generator.generate(&word_list, &mut rng)
    }
    .map_err(|e| {
        tracing::info!(
            "User {} ({}) game rejected, could not place '{}'",
            user.username,
            user.user_id,
            e.word
        );
        e
    })?;

    let game = state
        .store
        .create_game(NewGame {
            title: payload.title,
            description: payload.description,
            word_list,
            grid,
            created_by: user.user_id,
        })
        .await?;

    tracing::info!(
        "User {} ({}) created game {} with {} words",
        user.username,
        user.user_id,
        game.id,
        game.word_list.len()
    );

    Ok(Json(game))
}

/// All games, newest first
pub async fn list_games(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Game>>, ApiError> {
    Ok(Json(state.store.list_games().await?))
}

pub async fn get_game(
    Path(game_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Game>, ApiError> {
    state
        .store
        .get_game(game_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Game not found".to_string()))
}

/// Delete a game along with its results and comments. Creator only.
pub async fn delete_game(
    user: AuthenticatedUser,
    Path(game_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let game = state
        .store
        .get_game(game_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Game not found".to_string()))?;

    if game.creator.id != user.user_id {
        tracing::warn!(
            "User {} ({}) tried to delete game {} owned by {}",
            user.username,
            user.user_id,
            game_id,
            game.creator.id
        );
        return Err(ApiError::Forbidden(
            "Not authorized to delete this game".to_string(),
        ));
    }

    state.store.delete_game(game_id).await?;
    state.broadcaster.close_game(game_id);
    tracing::info!("Game {} deleted by its creator {}", game_id, user.user_id);

    Ok(Json(json!({ "message": "Game deleted successfully" })))
}
