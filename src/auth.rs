use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{error::ApiError, AppState};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,      // User ID
    pub username: String, // Username
    pub exp: usize,       // Expiration time
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
}

/// Extractor for authenticated users from JWT tokens
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let app_state = Arc::<AppState>::from_ref(state);

        // Try to extract token from Authorization header first
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(String::from)
            // If no Authorization header, try query parameter
            .or_else(|| {
                parts
                    .uri
                    .query()
                    .and_then(|q| {
                        serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok()
                    })
                    .and_then(|params| {
                        params
                            .iter()
                            .find(|(k, _)| k == "token")
                            .map(|(_, v)| v.clone())
                    })
            });

        async move {
            let token =
                token.ok_or_else(|| ApiError::Unauthorized("Missing token".to_string()))?;

            let claims = verify_token(&token, &app_state.config.security.jwt_secret)
                .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

            let user_id = claims
                .sub
                .parse::<i64>()
                .map_err(|_| ApiError::Unauthorized("Invalid token payload".to_string()))?;

            // The account may have been removed since the token was issued
            let user = app_state
                .store
                .get_user(user_id)
                .await?
                .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

            Ok(AuthenticatedUser {
                user_id: user.id,
                username: user.username,
            })
        }
    }
}

/// Generate a JWT token for a user
pub fn generate_token(
    user_id: i64,
    username: &str,
    jwt_secret: &str,
    ttl_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::minutes(ttl_minutes))
        .unwrap_or_else(chrono::Utc::now)
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        exp: expiration as usize,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_ref()),
    )
}

/// Check signature and expiry, returning the token's claims
pub fn verify_token(token: &str, jwt_secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// Hash a password with bcrypt. Salted, so equal passwords give different digests.
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

pub fn verify_password(password: &str, digest: &str) -> bool {
    bcrypt::verify(password, digest).unwrap_or_else(|e| {
        tracing::warn!("Password digest could not be checked: {}", e);
        false
    })
}
