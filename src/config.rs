use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, time::Duration};

use crate::game::grid::{DEFAULT_GRID_SIZE, MAX_PLACEMENT_TRIALS};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub game: GameConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Without a URL the server keeps everything in memory
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub grid_size: usize,
    pub placement_trials: usize,
    /// Queued broadcasts per live viewer
    pub subscriber_buffer: usize,
    pub send_timeout_ms: u64,
}

impl GameConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
        };

        let server = ServerConfig {
            host: env::var("HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("PORT must be a number")?,
            cors_origins: parse_origins(
                &env::var("CORS_ORIGINS")
                    .unwrap_or_else(|_| "http://127.0.0.1:5173,http://localhost:5173".to_string()),
            ),
        };

        let security = SecurityConfig {
            jwt_secret: env::var("JWT_SECRET")
                .context("JWT_SECRET must be set")?,
            token_ttl_minutes: env::var("TOKEN_TTL_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("TOKEN_TTL_MINUTES must be a number")?,
            bcrypt_cost: env::var("BCRYPT_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(bcrypt::DEFAULT_COST),
        };

        let game = GameConfig {
            grid_size: env::var("GRID_SIZE")
                .unwrap_or_else(|_| DEFAULT_GRID_SIZE.to_string())
                .parse()
                .context("GRID_SIZE must be a number")?,
            placement_trials: env::var("PLACEMENT_TRIALS")
                .unwrap_or_else(|_| MAX_PLACEMENT_TRIALS.to_string())
                .parse()
                .unwrap_or(MAX_PLACEMENT_TRIALS),
            subscriber_buffer: env::var("SUBSCRIBER_BUFFER")
                .unwrap_or_else(|_| "32".to_string())
                .parse()
                .unwrap_or(32),
            send_timeout_ms: env::var("SUBSCRIBER_SEND_TIMEOUT_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .unwrap_or(2000),
        };

        if game.grid_size == 0 {
            anyhow::bail!("GRID_SIZE must be at least 1");
        }

        Ok(Config {
            database,
            server,
            security,
            game,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Settings for tests: in-memory store, cheap hashing, short timeouts
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            database: DatabaseConfig {
                url: None,
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: Vec::new(),
            },
            security: SecurityConfig {
                jwt_secret: "test-secret".to_string(),
                token_ttl_minutes: 60,
                bcrypt_cost: 4,
            },
            game: GameConfig {
                grid_size: DEFAULT_GRID_SIZE,
                placement_trials: MAX_PLACEMENT_TRIALS,
                subscriber_buffer: 8,
                send_timeout_ms: 200,
            },
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://a.test, http://b.test,,"),
            vec!["http://a.test", "http://b.test"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_server_addr() {
        let mut config = Config::for_tests();
        config.server.port = 8000;
        assert_eq!(config.server_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_send_timeout() {
        let config = Config::for_tests();
        assert_eq!(config.game.send_timeout(), Duration::from_millis(200));
    }
}
