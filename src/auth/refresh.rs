//! Defines the endpoint for exchanging a refresh token for a new access token.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::{
    Error, Json,
    auth::{
        log_in::LogInState,
        policy::get_caller,
        token::{TokenType, decode_token, encode_token},
    },
    db::lock_connection,
};

/// The request body for refreshing an access token.
#[derive(Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// A refresh token from a previous log in.
    pub refresh: String,
}

/// The response body with the new access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// Sent as a bearer token to access protected routes.
    pub access: String,
}

/// A route handler that issues a new access token for a valid refresh token.
///
/// The account must still exist and be active.
pub async fn post_token_refresh(
    State(state): State<LogInState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, Error> {
    let claims = decode_token(&request.refresh, TokenType::Refresh, &state.token_keys)?;

    {
        let connection = lock_connection(&state.db_connection)?;
        get_caller(claims.account_id, &connection)?;
    }

    let access = encode_token(
        claims.account_id,
        TokenType::Access,
        state.access_token_duration,
        &state.token_keys,
    )?;

    Ok(Json(RefreshResponse { access }))
}
