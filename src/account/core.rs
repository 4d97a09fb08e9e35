//! Defines the account model and the database queries for accounts.

use std::fmt::Display;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error, Money,
    auth::{PasswordHash, ValidatedPassword},
    role::{Role, RoleId},
};

/// The maximum number of characters in an account's display name.
pub const MAX_NAME_LENGTH: usize = 50;
/// The maximum number of characters in a phone number.
pub const MAX_PHONE_LENGTH: usize = 15;

// ============================================================================
// MODELS
// ============================================================================

/// A newtype wrapper for integer account IDs.
///
/// This helps disambiguate account IDs from other types of IDs, and lets the
/// auth middleware place the caller's ID in the request extensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct AccountId(i64);

impl AccountId {
    /// Create a new account ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the account ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for AccountId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for AccountId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(AccountId)
    }
}

/// A person who can log in and move money.
///
/// The password hash is deliberately not part of this struct so that it can
/// never be serialized into a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The display name of the account holder.
    pub name: String,
    /// The unique phone number used to log in.
    pub phone: String,
    /// The role assigned to the account, if any.
    pub role: Option<Role>,
    /// The amount of money held by the account.
    pub balance: Money,
    /// Inactive accounts cannot log in.
    pub is_active: bool,
    /// Staff accounts may flag transactions as fraudulent.
    pub is_staff: bool,
    /// When the account was registered.
    #[serde(with = "time::serde::rfc3339")]
    pub date_joined: OffsetDateTime,
}

/// The details needed to insert a new account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// The display name of the account holder.
    pub name: String,
    /// The unique phone number used to log in.
    pub phone: String,
    /// The salted and hashed password.
    pub password_hash: PasswordHash,
    /// The role assigned to the account, if any.
    pub role_id: Option<RoleId>,
    /// Whether the account may perform staff actions.
    pub is_staff: bool,
}

impl NewAccount {
    fn validate(&self) -> Result<(), Error> {
        validate_name(&self.name)?;

        let phone = self.phone.trim();
        if phone.is_empty() {
            return Err(Error::invalid_field("phone", "phone number is required"));
        }
        if phone.chars().count() > MAX_PHONE_LENGTH {
            return Err(Error::invalid_field(
                "phone",
                format!("phone number cannot be longer than {MAX_PHONE_LENGTH} characters"),
            ));
        }

        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::invalid_field("name", "name is required"));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(Error::invalid_field(
            "name",
            format!("name cannot be longer than {MAX_NAME_LENGTH} characters"),
        ));
    }

    Ok(())
}

/// The changes to apply to an existing account.
///
/// `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountUpdate {
    /// The new display name.
    #[serde(default)]
    pub name: Option<String>,
    /// The new role.
    #[serde(default)]
    pub role_id: Option<RoleId>,
    /// Remove the account's role. Cannot be combined with `role_id`.
    #[serde(default)]
    pub clear_role: bool,
    /// Activate or deactivate the account.
    #[serde(default)]
    pub is_active: Option<bool>,
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Validate the registration details and hash `password` with `password_cost`.
///
/// This does not touch the database, so callers can do the slow hashing
/// before taking the connection lock.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidField] if the name, phone or password is empty or too long,
/// - or [Error::HashingError] if the password could not be hashed.
pub fn prepare_registration(
    name: &str,
    phone: &str,
    password: &str,
    role_id: Option<RoleId>,
    password_cost: u32,
) -> Result<NewAccount, Error> {
    let mut new_account = NewAccount {
        name: name.to_owned(),
        phone: phone.to_owned(),
        password_hash: PasswordHash::new_unchecked(""),
        role_id,
        is_staff: false,
    };
    // Check the cheap fields before spending time on hashing.
    new_account.validate()?;
    new_account.password_hash = PasswordHash::new(ValidatedPassword::new(password)?, password_cost)?;

    Ok(new_account)
}

/// Register a new account with a zero balance.
///
/// The password is hashed with `password_cost` before it is stored.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidField] if the name, phone or password is empty or too long,
/// - [Error::DuplicatePhone] if the phone number is already registered,
/// - [Error::InvalidRole] if `role_id` does not refer to a valid role,
/// - [Error::HashingError] if the password could not be hashed,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn register_account(
    name: &str,
    phone: &str,
    password: &str,
    role_id: Option<RoleId>,
    password_cost: u32,
    connection: &Connection,
) -> Result<Account, Error> {
    let new_account = prepare_registration(name, phone, password, role_id, password_cost)?;

    create_account(new_account, connection)
}

/// Check `password` against the account registered with `phone`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCredentials] if no account has the phone number, the
///   password is wrong, or the account is inactive,
/// - [Error::HashingError] if the stored hash could not be checked,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn authenticate(phone: &str, password: &str, connection: &Connection) -> Result<Account, Error> {
    let (account, password_hash) = find_credentials(phone, connection)?;

    verify_credentials(account, &password_hash, password)
}

/// Get the account and password hash for `phone`, hiding whether the phone
/// number is registered.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCredentials] if no account has the phone number,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn find_credentials(
    phone: &str,
    connection: &Connection,
) -> Result<(Account, PasswordHash), Error> {
    match get_credentials(phone.trim(), connection) {
        Ok(credentials) => Ok(credentials),
        Err(Error::NotFound) => Err(Error::InvalidCredentials),
        Err(error) => Err(error),
    }
}

/// Check `password` against `password_hash` and return `account` if it
/// matches and the account is active.
///
/// This does not touch the database.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCredentials] if the password is wrong or the account is inactive,
/// - or [Error::HashingError] if the stored hash could not be checked.
pub fn verify_credentials(
    account: Account,
    password_hash: &PasswordHash,
    password: &str,
) -> Result<Account, Error> {
    if !password_hash.verify(password)? {
        tracing::info!("failed log in attempt for account {}", account.id);
        return Err(Error::InvalidCredentials);
    }

    if !account.is_active {
        tracing::info!("inactive account {} tried to log in", account.id);
        return Err(Error::InvalidCredentials);
    }

    Ok(account)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const SELECT_ACCOUNT: &str = "SELECT a.id, a.name, a.phone, a.role_id, r.name, a.balance, \
    a.is_active, a.is_staff, a.date_joined, a.password \
    FROM account a LEFT JOIN role r ON a.role_id = r.id";

/// Create the account table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                phone TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                role_id INTEGER,
                balance TEXT NOT NULL DEFAULT '0.00',
                is_active INTEGER NOT NULL DEFAULT 1,
                is_staff INTEGER NOT NULL DEFAULT 0,
                date_joined TEXT NOT NULL,
                FOREIGN KEY(role_id) REFERENCES role(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new account into the database.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidField] if the name or phone is empty or too long,
/// - [Error::DuplicatePhone] if the phone number is already registered,
/// - [Error::InvalidRole] if `role_id` does not refer to a valid role,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_account(new_account: NewAccount, connection: &Connection) -> Result<Account, Error> {
    new_account.validate()?;

    connection
        .execute(
            "INSERT INTO account (name, phone, password, role_id, balance, is_active, is_staff, date_joined)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7)",
            (
                new_account.name.trim(),
                new_account.phone.trim(),
                new_account.password_hash.as_ref(),
                new_account.role_id,
                Money::ZERO,
                new_account.is_staff,
                OffsetDateTime::now_utc(),
            ),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidRole(new_account.role_id.unwrap_or_default()),
            error => error.into(),
        })?;

    let id = AccountId::new(connection.last_insert_rowid());

    get_account(id, connection)
}

/// Get the account with `id`.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if `id` does not belong to a registered account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    let account = connection
        .prepare(&format!("{SELECT_ACCOUNT} WHERE a.id = :id"))?
        .query_row(&[(":id", &id)], map_account_row)?;

    Ok(account)
}

/// Get the account registered with `phone` along with its password hash.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if `phone` does not belong to a registered account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_credentials(
    phone: &str,
    connection: &Connection,
) -> Result<(Account, PasswordHash), Error> {
    let credentials = connection
        .prepare(&format!("{SELECT_ACCOUNT} WHERE a.phone = :phone"))?
        .query_row(&[(":phone", &phone)], |row| {
            let account = map_account_row(row)?;
            let raw_password_hash: String = row.get(9)?;

            Ok((account, PasswordHash::new_unchecked(&raw_password_hash)))
        })?;

    Ok(credentials)
}

/// Get every account, ordered by ID.
///
/// # Errors
///
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn list_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!("{SELECT_ACCOUNT} ORDER BY a.id"))?
        .query_map([], map_account_row)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Apply `update` to the account with `id` and return the updated account.
///
/// # Errors
///
/// This function will return a:
/// - [Error::UpdateMissingAccount] if `id` does not belong to a registered account,
/// - [Error::InvalidField] if the new name is empty or too long, or the
///   update both sets and clears the role,
/// - [Error::InvalidRole] if the new role does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_account(
    id: AccountId,
    update: AccountUpdate,
    connection: &Connection,
) -> Result<Account, Error> {
    let account = match get_account(id, connection) {
        Ok(account) => account,
        Err(Error::NotFound) => return Err(Error::UpdateMissingAccount),
        Err(error) => return Err(error),
    };

    if let Some(name) = &update.name {
        validate_name(name)?;
    }

    if update.clear_role && update.role_id.is_some() {
        return Err(Error::invalid_field(
            "role_id",
            "cannot set and clear the role at the same time",
        ));
    }

    let name = update.name.as_deref().map(str::trim).unwrap_or(&account.name);
    let role_id = if update.clear_role {
        None
    } else {
        update
            .role_id
            .or_else(|| account.role.as_ref().map(|role| role.id))
    };
    let is_active = update.is_active.unwrap_or(account.is_active);

    connection
        .execute(
            "UPDATE account SET name = ?1, role_id = ?2, is_active = ?3 WHERE id = ?4",
            (name, role_id, is_active, id),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidRole(role_id.unwrap_or_default()),
            error => error.into(),
        })?;

    get_account(id, connection)
}

/// Delete the account with `id`.
///
/// # Errors
///
/// This function will return a:
/// - [Error::DeleteMissingAccount] if `id` does not belong to a registered account,
/// - [Error::AccountInUse] if a transaction refers to the account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_account(id: AccountId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection
        .execute("DELETE FROM account WHERE id = :id", &[(":id", &id)])
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::AccountInUse,
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingAccount);
    }

    Ok(())
}

/// Overwrite the balance of the account with `id`.
///
/// Only transaction creation should call this, inside the same SQL
/// transaction that inserts the ledger record.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if `id` does not belong to a registered account,
/// - or [Error::SqlError] if there is some other SQL error.
pub(crate) fn set_balance(
    id: AccountId,
    balance: Money,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET balance = ?1 WHERE id = ?2",
        (balance, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    let role_id: Option<RoleId> = row.get(3)?;
    let role_name: Option<String> = row.get(4)?;
    let role = match (role_id, role_name) {
        (Some(id), Some(name)) => Some(Role { id, name }),
        _ => None,
    };

    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        role,
        balance: row.get(5)?,
        is_active: row.get(6)?,
        is_staff: row.get(7)?,
        date_joined: row.get(8)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
