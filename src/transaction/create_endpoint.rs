//! Defines the endpoint for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, Json, Money,
    account::AccountId,
    auth::get_caller,
    db::lock_connection,
    transaction::{Transaction, TransactionResponse, TransactionType, core::create_transaction},
};

/// The state needed to create, list or review transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a transaction.
///
/// The origin is always the authenticated account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    /// The kind of money movement.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The hour counter the transaction happened at.
    pub step: u16,
    /// How much money to move, as a string or a number.
    pub amount: Decimal,
    /// The receiving account. Required for transfers.
    #[serde(default)]
    pub destination_id: Option<AccountId>,
}

/// A route handler for creating a new transaction, responds with 201 Created
/// and the stored transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(caller_id): Extension<AccountId>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<Response, Error> {
    if !Money::is_representable(request.amount) {
        return Err(Error::invalid_field(
            "amount",
            "amount must have at most 2 decimal places and 15 digits",
        ));
    }

    let connection = lock_connection(&state.db_connection)?;
    let caller = get_caller(caller_id, &connection)?;

    let new_transaction = Transaction::build(
        request.transaction_type,
        caller.id,
        Money::new(request.amount),
        request.step,
    )
    .destination(request.destination_id);

    let transaction = create_transaction(new_transaction, &connection)
        .inspect_err(|error| tracing::debug!("could not create transaction: {error}"))?;

    tracing::info!(
        "account {} created {} transaction {}",
        caller.id,
        transaction.transaction_type,
        transaction.reference
    );

    let response = TransactionResponse::load(transaction, &connection)?;

    Ok((StatusCode::CREATED, Json(response)).into_response())
}
