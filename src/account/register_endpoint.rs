//! Defines the endpoint for registering a new account.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, Json,
    account::{Account, create_account, prepare_registration},
    db::lock_connection,
    role::RoleId,
};

/// The state needed to register an account.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost used to hash new passwords.
    pub password_cost: u32,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            password_cost: state.password_cost,
        }
    }
}

/// The request body for registering an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// The display name of the account holder.
    pub name: String,
    /// The phone number the account holder will log in with.
    pub phone: String,
    /// The plain text password, hashed before it is stored.
    pub password: String,
    /// An optional role to assign to the new account.
    #[serde(default)]
    pub role_id: Option<RoleId>,
}

/// The response body for a successful registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// The newly created account.
    pub user: Account,
    /// A confirmation message.
    pub message: String,
}

/// A route handler for registering a new account, responds with 201 Created
/// and the new account.
pub async fn register_endpoint(
    State(state): State<RegistrationState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, Error> {
    // Hash before taking the lock so other requests are not held up.
    let new_account = prepare_registration(
        &request.name,
        &request.phone,
        &request.password,
        request.role_id,
        state.password_cost,
    )
    .inspect_err(|error| tracing::debug!("could not register account: {error}"))?;

    let account = {
        let connection = lock_connection(&state.db_connection)?;
        create_account(new_account, &connection)
            .inspect_err(|error| tracing::debug!("could not register account: {error}"))?
    };

    tracing::info!("registered account {}", account.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: account,
            message: "Account created successfully".to_owned(),
        }),
    )
        .into_response())
}
