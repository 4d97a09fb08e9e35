//! Password checks and bcrypt hashing.

use std::fmt;

use crate::Error;

/// A plain text password that passed validation and is ready to be hashed.
#[derive(Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Accept `raw_password` as long as it is not empty.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidField] for the `password` field if it is empty.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        if raw_password.is_empty() {
            return Err(Error::invalid_field("password", "password cannot be empty"));
        }

        Ok(Self(raw_password.to_owned()))
    }
}

// Keeps plain text passwords out of logs and panic messages.
impl fmt::Debug for ValidatedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValidatedPassword(********)")
    }
}

/// A bcrypt hash as stored in the `account.password` column.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The bcrypt cost used outside of tests.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with a fresh salt. Higher `cost` values are slower.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt rejects the cost or fails.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        bcrypt::hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash loaded from the database without checking its format.
    pub fn new_unchecked(raw_hash: &str) -> Self {
        Self(raw_hash.to_owned())
    }

    /// Validate and hash `raw_password` in one step.
    ///
    /// # Errors
    ///
    /// Returns the errors of [ValidatedPassword::new] and [PasswordHash::new].
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        Self::new(ValidatedPassword::new(raw_password)?, cost)
    }

    /// Whether `raw_password` hashes to this hash.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the stored hash is malformed.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        bcrypt::verify(raw_password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod password_tests {
    use crate::{Error, auth::PasswordHash};

    use super::ValidatedPassword;

    const COST: u32 = 4;

    #[test]
    fn empty_password_is_rejected() {
        assert!(matches!(
            ValidatedPassword::new(""),
            Err(Error::InvalidField {
                field: "password",
                ..
            })
        ));
        assert!(PasswordHash::from_raw_password("", COST).is_err());
    }

    #[test]
    fn debug_output_masks_password() {
        let password = ValidatedPassword::new("correct horse").unwrap();

        let debug = format!("{password:?}");

        assert!(!debug.contains("correct horse"), "got {debug}");
    }

    #[test]
    fn hash_only_matches_original_password() {
        let hash = PasswordHash::from_raw_password("correct horse", COST).unwrap();

        assert!(hash.verify("correct horse").unwrap());
        assert!(!hash.verify("battery staple").unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        let password = ValidatedPassword::new("correct horse").unwrap();

        let first = PasswordHash::new(password.clone(), COST).unwrap();
        let second = PasswordHash::new(password, COST).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        let hash = PasswordHash::new_unchecked("not a bcrypt hash");

        assert!(matches!(
            hash.verify("correct horse"),
            Err(Error::HashingError(_))
        ));
    }

    #[test]
    fn invalid_cost_is_an_error() {
        let password = ValidatedPassword::new("correct horse").unwrap();

        assert!(matches!(
            PasswordHash::new(password, 100),
            Err(Error::HashingError(_))
        ));
    }
}
