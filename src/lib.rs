//! fraud_ledger is a backend for tracking money movements between accounts and
//! flagging suspected fraud.
//!
//! This library provides a JSON REST API for registering accounts, logging in
//! with a phone number and password for a signed token pair, recording
//! transactions that update account balances, and letting staff mark
//! transactions as fraudulent or legitimate.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod account;
mod app_state;
mod auth;
mod db;
pub mod endpoints;
mod json;
mod logging;
mod money;
mod role;
mod routing;
mod transaction;

pub use account::{
    Account, AccountId, AccountUpdate, NewAccount, authenticate, create_account, get_account,
    register_account,
};
pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use json::Json;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::{Money, UnrepresentableAmount};
pub use role::{ADMIN_ROLE, Role, RoleId, get_or_create_role};
pub use routing::build_router;
pub use transaction::{
    NewTransaction, PredictedResult, Transaction, TransactionType, create_transaction,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A request field was missing, malformed or outside its allowed range.
    ///
    /// `field` names the offending field so clients can show the message next
    /// to the right input.
    #[error("{field}: {message}")]
    InvalidField {
        /// The name of the field as it appears in the request body.
        field: &'static str,
        /// A human readable explanation of what is wrong with the field.
        message: String,
    },

    /// The phone number used to register an account is already in use.
    #[error("an account with this phone number already exists")]
    DuplicatePhone,

    /// The transaction reference already exists in the database.
    #[error("a transaction with this reference already exists")]
    DuplicateReference,

    /// Every generated reference collided with an existing one.
    #[error("could not generate a unique transaction reference")]
    ReferenceExhausted,

    /// The role ID used to create or update an account did not match a valid role.
    #[error("the role ID {0} does not refer to a valid role")]
    InvalidRole(RoleId),

    /// The destination account of a transaction does not exist.
    #[error("the account ID {0} does not refer to a valid account")]
    InvalidDestination(AccountId),

    /// The phone number or password was wrong, or the account is inactive.
    ///
    /// The message is deliberately the same for every case so that clients
    /// cannot tell which of the credentials was wrong.
    #[error("invalid phone number or password")]
    InvalidCredentials,

    /// The bearer or refresh token was missing, malformed, expired or of the
    /// wrong kind.
    #[error("the token is missing, invalid or expired")]
    InvalidToken,

    /// The authenticated account is not allowed to perform the action.
    #[error("you do not have permission to perform this action")]
    Forbidden,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., reference) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to delete an account that is still the origin or destination of
    /// a transaction.
    #[error("the account is referenced by transactions and cannot be deleted")]
    AccountInUse,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl Error {
    /// Shorthand for creating an [Error::InvalidField].
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidField {
            field,
            message: message.into(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidField { .. }
            | Error::DuplicatePhone
            | Error::DuplicateReference
            | Error::InvalidRole(_)
            | Error::InvalidDestination(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound | Error::UpdateMissingAccount | Error::DeleteMissingAccount => {
                StatusCode::NOT_FOUND
            }
            Error::AccountInUse => StatusCode::CONFLICT,
            Error::ReferenceExhausted
            | Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn field(&self) -> Option<&'static str> {
        match self {
            Error::InvalidField { field, .. } => Some(*field),
            Error::DuplicatePhone => Some("phone"),
            Error::DuplicateReference => Some("reference"),
            Error::InvalidRole(_) => Some("role_id"),
            Error::InvalidDestination(_) => Some("destination_id"),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("account.phone") =>
            {
                Error::DuplicatePhone
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("transaction.reference") =>
            {
                Error::DuplicateReference
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = if status.is_server_error() {
            // Any errors that are server errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            json!({ "error": "An unexpected error occurred, check the server logs for more details." })
        } else if let Some(field) = self.field() {
            let message = match &self {
                Error::InvalidField { message, .. } => message.clone(),
                error => error.to_string(),
            };
            json!({ "error": message, "field": field })
        } else {
            json!({ "error": self.to_string() })
        };

        (status, axum::Json(body)).into_response()
    }
}
