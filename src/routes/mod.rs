pub mod auth;
pub mod comments;
pub mod games;
pub mod health;
pub mod results;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::{websocket, AppState};

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/ws/games/{game_id}/results",
            get(websocket::handle_game_results_socket),
        )
        .merge(auth_routes())
        .merge(game_routes())
}

fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
}

fn game_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/games", get(games::list_games).post(games::create_game))
        .route(
            "/games/{game_id}",
            get(games::get_game).delete(games::delete_game),
        )
        .route(
            "/games/{game_id}/results",
            get(results::list_results).post(results::create_result),
        )
        .route(
            "/games/{game_id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/comments/{comment_id}", delete(comments::delete_comment))
}
