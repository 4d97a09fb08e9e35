//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, Transaction as SqlTransaction, TransactionBehavior,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error, Money,
    account::{AccountId, get_account, set_balance},
    transaction::reference::{generate_reference, is_valid_reference},
};

/// Alias for the integer type used for transaction IDs.
pub type TransactionId = i64;

/// The largest allowed hour counter, the maximum of a signed 16 bit integer.
pub const MAX_STEP: u16 = i16::MAX as u16;

/// How many times to generate a new reference before giving up.
const MAX_REFERENCE_ATTEMPTS: usize = 8;

// ============================================================================
// MODELS
// ============================================================================

/// The kind of money movement a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// A deposit into the origin account.
    CashIn,
    /// A withdrawal from the origin account.
    CashOut,
    /// Money moved from the origin account to the destination account.
    Transfer,
    /// A payment made by the origin account.
    Payment,
    /// A direct debit taken from the origin account.
    Debit,
}

impl TransactionType {
    /// Whether money leaves the origin account.
    pub fn is_outgoing(&self) -> bool {
        !matches!(self, TransactionType::CashIn)
    }

    /// The name used in requests, responses and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::CashIn => "CASH_IN",
            TransactionType::CashOut => "CASH_OUT",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::Payment => "PAYMENT",
            TransactionType::Debit => "DEBIT",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH_IN" => Ok(TransactionType::CashIn),
            "CASH_OUT" => Ok(TransactionType::CashOut),
            "TRANSFER" => Ok(TransactionType::Transfer),
            "PAYMENT" => Ok(TransactionType::Payment),
            "DEBIT" => Ok(TransactionType::Debit),
            other => Err(Error::invalid_field(
                "type",
                format!("{other:?} is not a valid transaction type"),
            )),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(error.to_string().into()))
    }
}

/// The outcome of the fraud review of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictedResult {
    /// Not reviewed yet.
    #[default]
    Pending,
    /// Reviewed and found to be legitimate.
    Legit,
    /// Reviewed and flagged for a closer look.
    Suspicious,
    /// Reviewed and found to be fraudulent.
    Fraud,
}

impl PredictedResult {
    /// The name used in requests, responses and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictedResult::Pending => "PENDING",
            PredictedResult::Legit => "LEGIT",
            PredictedResult::Suspicious => "SUSPICIOUS",
            PredictedResult::Fraud => "FRAUD",
        }
    }
}

impl ToSql for PredictedResult {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PredictedResult {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "PENDING" => Ok(PredictedResult::Pending),
            "LEGIT" => Ok(PredictedResult::Legit),
            "SUSPICIOUS" => Ok(PredictedResult::Suspicious),
            "FRAUD" => Ok(PredictedResult::Fraud),
            other => Err(FromSqlError::Other(
                format!("invalid predicted result {other:?}").into(),
            )),
        }
    }
}

/// A ledger record of one movement of money.
///
/// To create a new `Transaction`, use [Transaction::build] and
/// [create_transaction].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The unique, human readable identifier, e.g. `TRX-20250307-4KQ9ZD`.
    pub reference: String,
    /// The kind of money movement.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The hour counter the transaction happened at.
    pub step: u16,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// The account that initiated the transaction.
    pub origin_id: AccountId,
    /// The receiving account, if any.
    pub destination_id: Option<AccountId>,
    /// How much money moved.
    pub amount: Money,
    /// The origin balance before the transaction.
    #[serde(rename = "oldbalanceOrg")]
    pub old_balance_origin: Money,
    /// The origin balance after the transaction.
    #[serde(rename = "newbalanceOrig")]
    pub new_balance_origin: Money,
    /// The destination balance before a transfer.
    #[serde(rename = "oldbalanceDest")]
    pub old_balance_destination: Option<Money>,
    /// The destination balance after a transfer.
    #[serde(rename = "newbalanceDest")]
    pub new_balance_destination: Option<Money>,
    /// The outcome of the fraud review.
    pub result_predicted: PredictedResult,
    /// How confident the reviewer is in `result_predicted`, from 0 to 1.
    pub confidence_score: Option<f64>,
    /// Whether a staff member has checked the transaction.
    pub is_verified: bool,
    /// Why the transaction was flagged.
    pub fraud_flag_reason: String,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(
        transaction_type: TransactionType,
        origin_id: AccountId,
        amount: Money,
        step: u16,
    ) -> NewTransaction {
        NewTransaction {
            transaction_type,
            origin_id,
            destination_id: None,
            amount,
            step,
            reference: None,
        }
    }

    /// Whether the transaction has been marked as fraudulent.
    pub fn is_fraud(&self) -> bool {
        self.result_predicted == PredictedResult::Fraud
    }

    /// The step expressed in minutes.
    pub fn duration_minutes(&self) -> u32 {
        u32::from(self.step) * 60
    }
}

/// A builder for the details of a transaction that has not been stored yet.
///
/// ```ignore
/// let new_transaction = Transaction::build(
///         TransactionType::Transfer,
///         origin.id,
///         Money::new(dec!(10.00)),
///         1,
///     )
///     .destination(Some(destination.id));
/// let transaction = create_transaction(new_transaction, &connection)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The kind of money movement.
    pub transaction_type: TransactionType,
    /// The account that initiated the transaction.
    pub origin_id: AccountId,
    /// The receiving account. Required for transfers.
    pub destination_id: Option<AccountId>,
    /// How much money moved. Must be positive.
    pub amount: Money,
    /// The hour counter, at most [MAX_STEP].
    pub step: u16,
    /// A fixed reference. One is generated when this is `None`.
    pub reference: Option<String>,
}

impl NewTransaction {
    /// Set the receiving account.
    pub fn destination(mut self, destination_id: Option<AccountId>) -> Self {
        self.destination_id = destination_id;
        self
    }

    /// Use `reference` instead of generating one.
    pub fn reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    fn validate(&self) -> Result<(), Error> {
        if !self.amount.is_positive() {
            return Err(Error::invalid_field(
                "amount",
                "amount must be at least 0.01",
            ));
        }

        if !Money::is_representable(self.amount.as_decimal()) {
            return Err(Error::invalid_field(
                "amount",
                "amount must have at most 15 digits",
            ));
        }

        if self.step > MAX_STEP {
            return Err(Error::invalid_field(
                "step",
                format!("step must be at most {MAX_STEP}"),
            ));
        }

        match self.destination_id {
            None if self.transaction_type == TransactionType::Transfer => {
                return Err(Error::invalid_field(
                    "destination_id",
                    "a transfer requires a destination account",
                ));
            }
            Some(destination_id) if destination_id == self.origin_id => {
                return Err(Error::invalid_field(
                    "destination_id",
                    "the destination cannot be the origin account",
                ));
            }
            _ => {}
        }

        if let Some(reference) = &self.reference
            && !is_valid_reference(reference)
        {
            return Err(Error::invalid_field(
                "reference",
                "reference must look like TRX-YYYYMMDD-XXXXXX",
            ));
        }

        Ok(())
    }
}

/// The account balances before and after a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSnapshot {
    /// The origin balance before the transaction.
    pub old_origin: Money,
    /// The origin balance after the transaction.
    pub new_origin: Money,
    /// The destination balance before a transfer.
    pub old_destination: Option<Money>,
    /// The destination balance after a transfer.
    pub new_destination: Option<Money>,
}

/// Compute the balances that result from moving `amount`.
///
/// Outgoing transactions are not checked against the origin balance, so the
/// new origin balance may be negative. Destination balances are only
/// computed for transfers.
pub fn compute_balances(
    transaction_type: TransactionType,
    amount: Money,
    origin_balance: Money,
    destination_balance: Option<Money>,
) -> BalanceSnapshot {
    let new_origin = if transaction_type.is_outgoing() {
        origin_balance - amount
    } else {
        origin_balance + amount
    };

    let (old_destination, new_destination) = match (transaction_type, destination_balance) {
        (TransactionType::Transfer, Some(balance)) => (Some(balance), Some(balance + amount)),
        _ => (None, None),
    };

    BalanceSnapshot {
        old_origin: origin_balance,
        new_origin,
        old_destination,
        new_destination,
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_TRANSACTION: &str = "SELECT id, reference, type, step, created_at, origin_id, \
    destination_id, amount, old_balance_origin, new_balance_origin, old_balance_destination, \
    new_balance_destination, result_predicted, confidence_score, is_verified, fraud_flag_reason \
    FROM \"transaction\"";

/// Create the transaction table and its indexes.
///
/// # Errors
/// Returns an error if the table or indexes cannot be created.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            reference TEXT NOT NULL UNIQUE,
            type TEXT NOT NULL,
            step INTEGER NOT NULL CHECK (step BETWEEN 0 AND 32767),
            created_at TEXT NOT NULL,
            origin_id INTEGER NOT NULL,
            destination_id INTEGER,
            amount TEXT NOT NULL,
            old_balance_origin TEXT NOT NULL,
            new_balance_origin TEXT NOT NULL,
            old_balance_destination TEXT,
            new_balance_destination TEXT,
            result_predicted TEXT NOT NULL DEFAULT 'PENDING',
            confidence_score REAL,
            is_verified INTEGER NOT NULL DEFAULT 0,
            fraud_flag_reason TEXT NOT NULL DEFAULT '',
            FOREIGN KEY(origin_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT,
            FOREIGN KEY(destination_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_reference ON \"transaction\"(reference)",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_type ON \"transaction\"(type)",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_result ON \"transaction\"(result_predicted)",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_origin_created_at \
        ON \"transaction\"(origin_id, created_at)",
        (),
    )?;

    Ok(())
}

/// Store a new transaction and apply it to the balances of the accounts involved.
///
/// The balance snapshots, the insert and the balance writes all happen in one
/// immediate SQLite transaction, so either all of them are stored or none are.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidField] if the amount, step, destination or reference is invalid,
/// - [Error::NotFound] if the origin account does not exist,
/// - [Error::InvalidDestination] if the destination account does not exist,
/// - [Error::DuplicateReference] if a supplied reference is already taken,
/// - [Error::ReferenceExhausted] if no unique reference could be generated,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    new_transaction.validate()?;

    let sql_transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let origin = get_account(new_transaction.origin_id, &sql_transaction)?;
    let destination = match new_transaction.destination_id {
        Some(destination_id) => match get_account(destination_id, &sql_transaction) {
            Ok(destination) => Some(destination),
            Err(Error::NotFound) => return Err(Error::InvalidDestination(destination_id)),
            Err(error) => return Err(error),
        },
        None => None,
    };

    let balances = compute_balances(
        new_transaction.transaction_type,
        new_transaction.amount,
        origin.balance,
        destination.as_ref().map(|destination| destination.balance),
    );
    let created_at = OffsetDateTime::now_utc();

    let transaction = match &new_transaction.reference {
        Some(reference) => insert_transaction(
            &new_transaction,
            reference,
            created_at,
            &balances,
            &sql_transaction,
        )?,
        None => {
            let mut rng = rand::thread_rng();
            let mut attempts = 0;

            loop {
                if attempts == MAX_REFERENCE_ATTEMPTS {
                    return Err(Error::ReferenceExhausted);
                }
                attempts += 1;

                let reference = generate_reference(created_at.date(), &mut rng);
                match insert_transaction(
                    &new_transaction,
                    &reference,
                    created_at,
                    &balances,
                    &sql_transaction,
                ) {
                    Err(Error::DuplicateReference) => {
                        tracing::warn!("generated reference {reference} is taken, retrying");
                    }
                    result => break result?,
                }
            }
        }
    };

    set_balance(origin.id, balances.new_origin, &sql_transaction)?;
    if let (Some(destination), Some(new_balance)) = (&destination, balances.new_destination) {
        set_balance(destination.id, new_balance, &sql_transaction)?;
    }

    sql_transaction.commit()?;

    Ok(transaction)
}

fn insert_transaction(
    new_transaction: &NewTransaction,
    reference: &str,
    created_at: OffsetDateTime,
    balances: &BalanceSnapshot,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (reference, type, step, created_at, origin_id, \
            destination_id, amount, old_balance_origin, new_balance_origin, \
            old_balance_destination, new_balance_destination, result_predicted)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            RETURNING id, reference, type, step, created_at, origin_id, destination_id, amount, \
            old_balance_origin, new_balance_origin, old_balance_destination, \
            new_balance_destination, result_predicted, confidence_score, is_verified, \
            fraud_flag_reason",
        )?
        .query_row(
            rusqlite::params![
                reference,
                new_transaction.transaction_type,
                new_transaction.step,
                created_at,
                new_transaction.origin_id,
                new_transaction.destination_id,
                new_transaction.amount,
                balances.old_origin,
                balances.new_origin,
                balances.old_destination,
                balances.new_destination,
                PredictedResult::Pending,
            ],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve the transaction with `reference`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `reference` does not refer to a stored transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction_by_reference(
    reference: &str,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!("{SELECT_TRANSACTION} WHERE reference = :reference"))?
        .query_row(&[(":reference", &reference)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve the transactions where `account_id` is the origin or the
/// destination, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is some SQL error.
pub fn list_transactions_for_account(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE origin_id = :account_id OR destination_id = :account_id \
            ORDER BY created_at DESC, id DESC"
        ))?
        .query_map(&[(":account_id", &account_id)], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Narrows the staff review listing. `None` fields match every transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewFilter {
    /// Only transactions of this kind.
    #[serde(default, rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// Only transactions with this review outcome.
    #[serde(default)]
    pub result_predicted: Option<PredictedResult>,
    /// Only verified or only unverified transactions.
    #[serde(default)]
    pub is_verified: Option<bool>,
    /// Text to look for in the reference or in either party's name.
    #[serde(default)]
    pub q: Option<String>,
}

/// Get every transaction matching `filter`, newest first.
///
/// # Errors
///
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn list_transactions_for_review(
    filter: &ReviewFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let pattern = filter
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", escape_like(q)));

    let mut conditions = Vec::new();
    let mut params: Vec<(&str, &dyn ToSql)> = Vec::new();

    if let Some(transaction_type) = &filter.transaction_type {
        conditions.push("type = :type");
        params.push((":type", transaction_type as &dyn ToSql));
    }
    if let Some(result_predicted) = &filter.result_predicted {
        conditions.push("result_predicted = :result_predicted");
        params.push((":result_predicted", result_predicted as &dyn ToSql));
    }
    if let Some(is_verified) = &filter.is_verified {
        conditions.push("is_verified = :is_verified");
        params.push((":is_verified", is_verified as &dyn ToSql));
    }
    if let Some(pattern) = &pattern {
        conditions.push(
            "(reference LIKE :q ESCAPE '\\' \
            OR origin_id IN (SELECT id FROM account WHERE name LIKE :q ESCAPE '\\') \
            OR destination_id IN (SELECT id FROM account WHERE name LIKE :q ESCAPE '\\'))",
        );
        params.push((":q", pattern as &dyn ToSql));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} {where_clause} ORDER BY created_at DESC, id DESC"
        ))?
        .query_map(params.as_slice(), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Escape the LIKE wildcards in `text` using a backslash.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

/// Mark the transaction with `reference` as fraudulent.
///
/// Any earlier review is overwritten.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `reference` does not refer to a stored transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn mark_as_fraud(
    reference: &str,
    reason: &str,
    confidence: Option<f64>,
    connection: &Connection,
) -> Result<Transaction, Error> {
    set_review(
        reference,
        PredictedResult::Fraud,
        reason,
        confidence,
        connection,
    )
}

/// Mark the transaction with `reference` for a closer look.
///
/// Any earlier review is overwritten.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `reference` does not refer to a stored transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn mark_as_suspicious(
    reference: &str,
    reason: &str,
    confidence: Option<f64>,
    connection: &Connection,
) -> Result<Transaction, Error> {
    set_review(
        reference,
        PredictedResult::Suspicious,
        reason,
        confidence,
        connection,
    )
}

/// Mark the transaction with `reference` as legitimate.
///
/// Only the predicted result changes; the reason and confidence of an earlier
/// review are left as they were.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `reference` does not refer to a stored transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn mark_as_legit(reference: &str, connection: &Connection) -> Result<Transaction, Error> {
    update_returning(
        "UPDATE \"transaction\" SET result_predicted = ?1 WHERE reference = ?2",
        (PredictedResult::Legit, reference),
        connection,
    )
}

/// Record that a staff member has checked the transaction with `reference`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `reference` does not refer to a stored transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn mark_as_verified(reference: &str, connection: &Connection) -> Result<Transaction, Error> {
    update_returning(
        "UPDATE \"transaction\" SET is_verified = 1 WHERE reference = ?1",
        (reference,),
        connection,
    )
}

fn set_review(
    reference: &str,
    result: PredictedResult,
    reason: &str,
    confidence: Option<f64>,
    connection: &Connection,
) -> Result<Transaction, Error> {
    update_returning(
        "UPDATE \"transaction\" SET result_predicted = ?1, fraud_flag_reason = ?2, \
        confidence_score = ?3 WHERE reference = ?4",
        (result, reason, confidence, reference),
        connection,
    )
}

fn update_returning(
    update: &str,
    params: impl rusqlite::Params,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "{update} RETURNING id, reference, type, step, created_at, origin_id, \
            destination_id, amount, old_balance_origin, new_balance_origin, \
            old_balance_destination, new_balance_destination, result_predicted, \
            confidence_score, is_verified, fraud_flag_reason"
        ))?
        .query_row(params, map_transaction_row)?;

    Ok(transaction)
}

/// Map a database row to a [Transaction].
///
/// Expects the columns in the order of the table definition.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        reference: row.get(1)?,
        transaction_type: row.get(2)?,
        step: row.get(3)?,
        created_at: row.get(4)?,
        origin_id: row.get(5)?,
        destination_id: row.get(6)?,
        amount: row.get(7)?,
        old_balance_origin: row.get(8)?,
        new_balance_origin: row.get(9)?,
        old_balance_destination: row.get(10)?,
        new_balance_destination: row.get(11)?,
        result_predicted: row.get(12)?,
        confidence_score: row.get(13)?,
        is_verified: row.get(14)?,
        fraud_flag_reason: row.get(15)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod compute_balances_tests {
    use rust_decimal_macros::dec;

    use crate::Money;

    use super::{TransactionType, compute_balances};

    #[test]
    fn cash_in_adds_to_origin() {
        let balances = compute_balances(
            TransactionType::CashIn,
            Money::new(dec!(25.50)),
            Money::new(dec!(100.00)),
            None,
        );

        assert_eq!(balances.old_origin, Money::new(dec!(100.00)));
        assert_eq!(balances.new_origin, Money::new(dec!(125.50)));
        assert_eq!(balances.old_destination, None);
        assert_eq!(balances.new_destination, None);
    }

    #[test]
    fn outgoing_types_subtract_from_origin() {
        for transaction_type in [
            TransactionType::CashOut,
            TransactionType::Payment,
            TransactionType::Debit,
        ] {
            let balances = compute_balances(
                transaction_type,
                Money::new(dec!(30.00)),
                Money::new(dec!(100.00)),
                None,
            );

            assert_eq!(
                balances.new_origin,
                Money::new(dec!(70.00)),
                "wrong balance for {transaction_type}"
            );
        }
    }

    #[test]
    fn outgoing_balance_may_go_negative() {
        let balances = compute_balances(
            TransactionType::CashOut,
            Money::new(dec!(30.00)),
            Money::new(dec!(10.00)),
            None,
        );

        assert_eq!(balances.new_origin, Money::new(dec!(-20.00)));
    }

    #[test]
    fn transfer_moves_money_to_destination() {
        let balances = compute_balances(
            TransactionType::Transfer,
            Money::new(dec!(10.00)),
            Money::new(dec!(50.00)),
            Some(Money::new(dec!(20.00))),
        );

        assert_eq!(balances.new_origin, Money::new(dec!(40.00)));
        assert_eq!(balances.old_destination, Some(Money::new(dec!(20.00))));
        assert_eq!(balances.new_destination, Some(Money::new(dec!(30.00))));
    }

    #[test]
    fn payment_does_not_touch_destination() {
        let balances = compute_balances(
            TransactionType::Payment,
            Money::new(dec!(10.00)),
            Money::new(dec!(50.00)),
            Some(Money::new(dec!(20.00))),
        );

        assert_eq!(balances.old_destination, None);
        assert_eq!(balances.new_destination, None);
    }
}
