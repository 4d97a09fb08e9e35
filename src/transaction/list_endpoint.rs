//! Defines the endpoints for listing transactions and viewing one transaction.

use axum::{
    Extension,
    extract::{Path, Query, State, rejection::QueryRejection},
};

use crate::{
    Error, Json,
    account::AccountId,
    auth::{ensure_staff, get_caller},
    db::lock_connection,
    transaction::{
        TransactionResponse, TransactionState,
        core::{
            ReviewFilter, get_transaction_by_reference, list_transactions_for_account,
            list_transactions_for_review,
        },
    },
};

/// A route handler that lists the caller's transactions, newest first.
///
/// A transaction belongs to the caller when the caller is its origin or its
/// destination.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(caller_id): Extension<AccountId>,
) -> Result<Json<Vec<TransactionResponse>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let caller = get_caller(caller_id, &connection)?;

    let transactions = list_transactions_for_account(caller.id, &connection)?
        .into_iter()
        .map(|transaction| TransactionResponse::load(transaction, &connection))
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(Json(transactions))
}

/// A staff route handler that lists every transaction matching the query
/// string filters, newest first.
///
/// Accepts `type`, `result_predicted`, `is_verified` and a free text `q` that
/// matches the reference or either party's name.
pub async fn review_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(caller_id): Extension<AccountId>,
    filter: Result<Query<ReviewFilter>, QueryRejection>,
) -> Result<Json<Vec<TransactionResponse>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let caller = get_caller(caller_id, &connection)?;
    ensure_staff(&caller)?;

    let Query(filter) = filter.map_err(|rejection| {
        Error::invalid_field("query", rejection.body_text())
    })?;

    let transactions = list_transactions_for_review(&filter, &connection)?
        .into_iter()
        .map(|transaction| TransactionResponse::load(transaction, &connection))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(transactions))
}

/// A route handler that gets a single transaction by its reference.
///
/// Responds with 404 Not Found unless the caller is a party to the
/// transaction or a staff account, so that other accounts cannot tell which
/// references exist.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(caller_id): Extension<AccountId>,
    Path(reference): Path<String>,
) -> Result<Json<TransactionResponse>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let caller = get_caller(caller_id, &connection)?;

    let transaction = get_transaction_by_reference(&reference, &connection)?;

    let is_party =
        transaction.origin_id == caller.id || transaction.destination_id == Some(caller.id);
    if !is_party && !caller.is_staff {
        return Err(Error::NotFound);
    }

    TransactionResponse::load(transaction, &connection).map(Json)
}
