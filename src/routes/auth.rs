use crate::{
    auth::{self, AuthenticatedUser},
    error::ApiError,
    models::{NewUser, User},
    AppState,
};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// JWT for authenticated API calls
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Register a new account
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let email = payload.email.trim().to_string();
    if payload.username.trim().is_empty() || !email.contains('@') || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username, a valid email and a password are required".to_string(),
        ));
    }

    if state.store.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    // bcrypt is deliberately slow, keep it off the async workers
    let cost = state.config.security.bcrypt_cost;
    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || auth::hash_password(&password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })?;

    let user = state
        .store
        .create_user(NewUser {
            username: payload.username.trim().to_string(),
            email,
            password_hash,
        })
        .await?;

    tracing::info!("Registered user: {} (ID: {})", user.username, user.id);

    Ok(Json(user.into()))
}

/// Exchange email and password for an access token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let invalid = || ApiError::BadRequest("Invalid email or password".to_string());

    let user = state
        .store
        .get_user_by_email(payload.email.trim())
        .await?
        .ok_or_else(invalid)?;

    let digest = user.password_hash.clone();
    let password = payload.password;
    let matches = tokio::task::spawn_blocking(move || auth::verify_password(&password, &digest))
        .await
        .map_err(|e| ApiError::Internal(format!("Password check task failed: {}", e)))?;
    if !matches {
        tracing::info!("Rejected login for user ID {}", user.id);
        return Err(invalid());
    }

    let access_token = auth::generate_token(
        user.id,
        &user.username,
        &state.config.security.jwt_secret,
        state.config.security.token_ttl_minutes,
    )
    .map_err(|e| {
        tracing::error!("Failed to generate JWT token: {}", e);
        ApiError::Internal("Failed to issue token".to_string())
    })?;

    tracing::info!("User logged in: {} (ID: {})", user.username, user.id);

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Current user information
pub async fn me(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<UserResponse>, ApiError> {
    let db_user = state
        .store
        .get_user(user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(db_user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_serialization() {
        let response = TokenResponse {
            access_token: "jwt".to_string(),
            token_type: "bearer".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["access_token"], "jwt");
        assert_eq!(json["token_type"], "bearer");
    }

    #[test]
    fn test_user_response_omits_password() {
        let user = User {
            id: 5,
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password_hash: "digest".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(json.contains("bob@example.com"));
        assert!(!json.contains("digest"));
    }

    #[test]
    fn test_signup_request_deserialization() {
        let json = r#"{"username": "bob", "email": "bob@example.com", "password": "pw"}"#;
        let request: SignupRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.username, "bob");
        assert_eq!(request.email, "bob@example.com");
    }
}
