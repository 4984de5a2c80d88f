use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::auth::Claims;
use crate::errors::AppError;
use crate::handlers::AppState;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
}

pub async fn me(Extension(claims): Extension<Claims>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "user_id": claims.sub,
        "team_id": claims.team_id,
        "role": claims.role,
        "expires_at": claims.exp,
    }))
}

/// Exchanges a still-valid token for a fresh one with the same identity.
pub async fn refresh(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = state
        .jwt
        .generate_token(claims.sub, claims.team_id, &claims.role)
        .map_err(|e| {
            tracing::error!("Token generation failed: {e}");
            AppError::internal("Token generation failed")
        })?;

    Ok(Json(TokenResponse {
        token,
        token_type: "Bearer",
    }))
}
