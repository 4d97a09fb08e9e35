//! The JSON shape of a transaction returned by the API.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    account::{Account, get_account},
    transaction::Transaction,
};

/// A transaction together with the accounts involved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// The stored transaction.
    #[serde(flatten)]
    pub transaction: Transaction,
    /// The account that initiated the transaction.
    pub origin: Account,
    /// The receiving account, if any.
    pub destination: Option<Account>,
    /// Whether the transaction has been marked as fraudulent.
    pub is_fraud: bool,
}

impl TransactionResponse {
    /// Load the accounts referenced by `transaction`.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the accounts could not be loaded.
    pub fn load(transaction: Transaction, connection: &Connection) -> Result<Self, Error> {
        let origin = get_account(transaction.origin_id, connection)?;
        let destination = transaction
            .destination_id
            .map(|destination_id| get_account(destination_id, connection))
            .transpose()?;

        Ok(Self {
            is_fraud: transaction.is_fraud(),
            transaction,
            origin,
            destination,
        })
    }
}
