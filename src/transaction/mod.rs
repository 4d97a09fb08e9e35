mod core;
mod create_endpoint;
mod fraud_check_endpoint;
mod list_endpoint;
mod reference;
mod response;

pub use core::{
    BalanceSnapshot, MAX_STEP, NewTransaction, PredictedResult, ReviewFilter, Transaction,
    TransactionId, TransactionType, compute_balances, create_transaction,
    create_transaction_table, get_transaction_by_reference, list_transactions_for_account,
    list_transactions_for_review, mark_as_fraud, mark_as_legit, mark_as_suspicious,
    mark_as_verified,
};
pub use create_endpoint::{CreateTransactionRequest, TransactionState, create_transaction_endpoint};
pub use fraud_check_endpoint::{FraudCheckRequest, fraud_check_endpoint, verify_transaction_endpoint};
pub use list_endpoint::{
    get_transaction_endpoint, list_transactions_endpoint, review_transactions_endpoint,
};
pub use reference::{generate_reference, is_valid_reference};
pub use response::TransactionResponse;
