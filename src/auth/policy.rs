//! Permission checks applied by route handlers after authentication.

use rusqlite::Connection;

use crate::{
    Error,
    account::{Account, AccountId, get_account},
};

/// Load the account that owns the access token on the current request.
///
/// A token can outlive its account, so a deleted or deactivated account is
/// treated the same as an invalid token.
///
/// # Errors
/// Returns [Error::InvalidToken] if the account no longer exists or is
/// inactive, or [Error::SqlError] on any other SQL error.
pub fn get_caller(account_id: AccountId, connection: &Connection) -> Result<Account, Error> {
    match get_account(account_id, connection) {
        Ok(account) if account.is_active => Ok(account),
        Ok(_) | Err(Error::NotFound) => Err(Error::InvalidToken),
        Err(error) => Err(error),
    }
}

/// Check that `caller` is a staff account.
///
/// # Errors
/// Returns [Error::Forbidden] otherwise.
pub fn ensure_staff(caller: &Account) -> Result<(), Error> {
    if caller.is_staff {
        Ok(())
    } else {
        tracing::info!("account {} tried to perform a staff action", caller.id);
        Err(Error::Forbidden)
    }
}

/// Check that `caller` is the account `target` or a staff account.
///
/// # Errors
/// Returns [Error::Forbidden] otherwise.
pub fn ensure_self_or_staff(caller: &Account, target: AccountId) -> Result<(), Error> {
    if caller.id == target {
        return Ok(());
    }

    ensure_staff(caller)
}
