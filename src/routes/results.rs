use crate::{
    error::ApiError,
    models::{GameResult, NewGameResult},
    websocket::messages::ServerMessage,
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

/// Store a finished run, then broadcast it to the game's live viewers.
///
/// The broadcast runs on its own task; the response does not wait for it.
pub async fn create_result(
    Path(game_id): Path<i64>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewGameResult>,
) -> Result<Json<GameResult>, ApiError> {
    if state.store.get_game(game_id).await?.is_none() {
        return Err(ApiError::NotFound("Game not found".to_string()));
    }

    let result = state.store.create_result(game_id, payload).await?;
    tracing::info!(
        "Result {} stored for game {} by {}",
        result.id,
        game_id,
        result.player_name
    );

    state
        .broadcaster
        .spawn_publish(game_id, ServerMessage::from(&result));

    Ok(Json(result))
}

pub async fn list_results(
    Path(game_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GameResult>>, ApiError> {
    if state.store.get_game(game_id).await?.is_none() {
        return Err(ApiError::NotFound("Game not found".to_string()));
    }

    Ok(Json(state.store.list_results(game_id).await?))
}
