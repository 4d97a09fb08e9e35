//! Defines the staff endpoints for reviewing transactions.

use axum::{
    Extension,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Json,
    account::AccountId,
    auth::{ensure_staff, get_caller},
    db::lock_connection,
    transaction::{
        TransactionResponse, TransactionState,
        core::{mark_as_fraud, mark_as_legit, mark_as_suspicious, mark_as_verified},
    },
};

/// The request body for a fraud check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudCheckRequest {
    /// Whether the transaction is fraudulent.
    pub is_fraud: bool,
    /// How confident the reviewer is, from 0 to 1.
    pub confidence_score: f64,
    /// Why the transaction was flagged.
    #[serde(default)]
    pub reason: String,
    /// Flag a non-fraudulent transaction for a closer look instead of
    /// clearing it.
    #[serde(default)]
    pub suspicious: bool,
}

/// A route handler for setting the predicted result of a transaction.
///
/// `is_fraud: true` marks the transaction as fraudulent with the given reason
/// and confidence. Otherwise the transaction is marked as legitimate, or as
/// suspicious when `suspicious` is set. Each call overwrites the last review.
pub async fn fraud_check_endpoint(
    State(state): State<TransactionState>,
    Extension(caller_id): Extension<AccountId>,
    Path(reference): Path<String>,
    Json(request): Json<FraudCheckRequest>,
) -> Result<Json<TransactionResponse>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let caller = get_caller(caller_id, &connection)?;
    ensure_staff(&caller)?;

    if !(0.0..=1.0).contains(&request.confidence_score) {
        return Err(Error::invalid_field(
            "confidence_score",
            "confidence score must be between 0 and 1",
        ));
    }

    let transaction = if request.is_fraud {
        mark_as_fraud(
            &reference,
            &request.reason,
            Some(request.confidence_score),
            &connection,
        )?
    } else if request.suspicious {
        mark_as_suspicious(
            &reference,
            &request.reason,
            Some(request.confidence_score),
            &connection,
        )?
    } else {
        mark_as_legit(&reference, &connection)?
    };

    tracing::info!(
        "account {} marked transaction {reference} as {}",
        caller.id,
        transaction.result_predicted.as_str()
    );

    TransactionResponse::load(transaction, &connection).map(Json)
}

/// A route handler for recording that a staff member checked a transaction.
pub async fn verify_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(caller_id): Extension<AccountId>,
    Path(reference): Path<String>,
) -> Result<Json<TransactionResponse>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let caller = get_caller(caller_id, &connection)?;
    ensure_staff(&caller)?;

    let transaction = mark_as_verified(&reference, &connection)?;
    tracing::info!("account {} verified transaction {reference}", caller.id);

    TransactionResponse::load(transaction, &connection).map(Json)
}
