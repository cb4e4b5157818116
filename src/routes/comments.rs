use crate::{
    auth::AuthenticatedUser,
    db::{self, DeleteOutcome},
    error::ApiError,
    models::Comment,
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
pub struct CreateCommentRequest {
    pub content: String,
}

pub async fn create_comment(
    user: AuthenticatedUser,
    Path(game_id): Path<i64>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Comment cannot be empty".to_string()));
    }
    if state.store.get_game(game_id).await?.is_none() {
        return Err(ApiError::NotFound("Game not found".to_string()));
    }

    let comment = state
        .store
        .create_comment(game_id, user.user_id, &payload.content)
        .await?;

    Ok(Json(comment))
}

/// Comments on a game, newest first
pub async fn list_comments(
    Path(game_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    if state.store.get_game(game_id).await?.is_none() {
        return Err(ApiError::NotFound("Game not found".to_string()));
    }

    Ok(Json(state.store.list_comments(game_id).await?))
}

/// Delete a comment. Allowed for its author and the game's creator.
pub async fn delete_comment(
    user: AuthenticatedUser,
    Path(comment_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    match db::delete_comment_as(state.store.as_ref(), comment_id, user.user_id).await? {
        DeleteOutcome::Deleted => Ok(Json(json!({ "message": "Comment deleted successfully" }))),
        DeleteOutcome::NotFound => Err(ApiError::NotFound("Comment not found".to_string())),
        DeleteOutcome::NotAuthorized => Err(ApiError::Forbidden(
            "Not authorized to delete this comment".to_string(),
        )),
    }
}
