//! Signed access and refresh tokens.
//!
//! Tokens are HS256 JSON Web Tokens. The signing key is derived from the server
//! secret so that the secret itself can be any length.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use time::{Duration, OffsetDateTime};

use crate::{Error, account::AccountId};

/// The default lifetime of an access token.
pub const DEFAULT_ACCESS_TOKEN_DURATION: Duration = Duration::minutes(15);
/// The default lifetime of a refresh token.
pub const DEFAULT_REFRESH_TOKEN_DURATION: Duration = Duration::days(1);

/// The keys used to sign and verify tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenKeys {
    /// Derive the signing keys from a `secret` string.
    pub fn from_secret(secret: &str) -> Self {
        let hash = Sha512::digest(secret);

        Self {
            encoding_key: EncodingKey::from_secret(hash.as_slice()),
            decoding_key: DecodingKey::from_secret(hash.as_slice()),
        }
    }
}

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Sent as a bearer token to access protected routes.
    Access,
    /// Exchanged for a new access token.
    Refresh,
}

/// The contents of a token.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The account the token was issued to.
    pub account_id: AccountId,
    /// What the token may be used for.
    pub token_type: TokenType,
    /// When the token was issued, as a unix timestamp.
    pub iat: i64,
    /// When the token expires, as a unix timestamp.
    pub exp: i64,
}

/// An access token and the refresh token that can renew it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Exchanged at the refresh endpoint for a new access token.
    pub refresh: String,
    /// Sent as a bearer token to access protected routes.
    pub access: String,
}

/// Sign a token of `token_type` for `account_id` that expires after `duration`.
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    account_id: AccountId,
    token_type: TokenType,
    duration: Duration,
    keys: &TokenKeys,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        account_id,
        token_type,
        iat: now.unix_timestamp(),
        exp: (now + duration).unix_timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify `token` and check that it is a token of type `expected`.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the signature is wrong, the token has
/// expired, or the token is not of type `expected`.
pub fn decode_token(token: &str, expected: TokenType, keys: &TokenKeys) -> Result<Claims, Error> {
    let claims = decode::<Claims>(token, &keys.decoding_key, &Validation::new(Algorithm::HS256))
        .map_err(|error| {
            tracing::debug!("rejected token: {error}");
            Error::InvalidToken
        })?
        .claims;

    if claims.token_type != expected {
        tracing::debug!(
            "rejected {:?} token where {:?} token was expected",
            claims.token_type,
            expected
        );
        return Err(Error::InvalidToken);
    }

    Ok(claims)
}

/// Issue a new access and refresh token for `account_id`.
///
/// # Errors
///
/// Returns [Error::TokenCreation] if either token could not be signed.
pub fn issue_token_pair(
    account_id: AccountId,
    access_duration: Duration,
    refresh_duration: Duration,
    keys: &TokenKeys,
) -> Result<TokenPair, Error> {
    Ok(TokenPair {
        refresh: encode_token(account_id, TokenType::Refresh, refresh_duration, keys)?,
        access: encode_token(account_id, TokenType::Access, access_duration, keys)?,
    })
}
