mod auth;
mod config;
mod db;
mod error;
mod game;
mod models;
mod routes;
mod utils;
mod websocket;

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, HeaderValue, Method};
use config::Config;
use db::{MemoryStore, PgStore, Store};
use game::GridGenerator;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use websocket::BroadcastRegistry;

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub generator: GridGenerator,
    /// Live result viewers, keyed by game id
    pub broadcaster: Arc<BroadcastRegistry>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        let generator = GridGenerator::new(config.game.grid_size, config.game.placement_trials);
        let broadcaster = Arc::new(BroadcastRegistry::new(
            config.game.subscriber_buffer,
            config.game.send_timeout(),
        ));

        Self {
            config,
            store,
            generator,
            broadcaster,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "word_search_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting word search backend server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let store: Arc<dyn Store> = match config.database.url.as_deref() {
        Some(url) => {
            let pool = db::create_pool(url, config.database.max_connections).await?;
            tracing::info!("Connected to database");

            let store = PgStore::new(pool);
            store.migrate().await?;
            tracing::info!("Database migrations completed");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, records are kept in memory and lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let state = Arc::new(AppState::new(config.clone(), store));

    // Configure CORS
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    // Build router
    let app = routes::create_routes()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Live results: ws://{}/ws/games/{{game_id}}/results", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
