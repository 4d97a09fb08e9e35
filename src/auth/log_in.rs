//! Defines the endpoint for exchanging phone credentials for a token pair.

use std::sync::{Arc, Mutex};

use axum::extract::{FromRef, State};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, Json,
    account::{Account, find_credentials, verify_credentials},
    auth::token::{TokenKeys, TokenPair, issue_token_pair},
    db::lock_connection,
};

/// The state needed to log in or refresh a token.
#[derive(Clone)]
pub struct LogInState {
    /// The database connection for looking up accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys used to sign and verify tokens.
    pub token_keys: TokenKeys,
    /// How long an access token is valid for.
    pub access_token_duration: Duration,
    /// How long a refresh token is valid for.
    pub refresh_token_duration: Duration,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            token_keys: state.token_keys.clone(),
            access_token_duration: state.access_token_duration,
            refresh_token_duration: state.refresh_token_duration,
        }
    }
}

/// The credentials sent to log in.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInRequest {
    /// The phone number the account was registered with.
    pub phone: String,
    /// The account's password.
    pub password: String,
}

/// The response body for a successful log in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogInResponse {
    /// The new token pair.
    #[serde(flatten)]
    pub tokens: TokenPair,
    /// The account that logged in.
    pub user: Account,
}

/// A route handler for logging in with a phone number and password.
///
/// Responds with a fresh access and refresh token along with the account, or
/// 401 Unauthorized if the credentials are wrong or the account is inactive.
pub async fn post_log_in(
    State(state): State<LogInState>,
    Json(request): Json<LogInRequest>,
) -> Result<Json<LogInResponse>, Error> {
    let (account, password_hash) = {
        let connection = lock_connection(&state.db_connection)?;
        find_credentials(&request.phone, &connection)?
    };
    // Checking the hash is slow, so it happens after the lock is released.
    let account = verify_credentials(account, &password_hash, &request.password)?;

    let tokens = issue_token_pair(
        account.id,
        state.access_token_duration,
        state.refresh_token_duration,
        &state.token_keys,
    )?;

    tracing::info!("account {} logged in", account.id);

    Ok(Json(LogInResponse {
        tokens,
        user: account,
    }))
}
