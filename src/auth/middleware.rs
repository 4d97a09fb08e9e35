//! Authentication middleware that validates bearer tokens.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    AppState, Error,
    auth::token::{TokenKeys, TokenType, decode_token},
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The keys used to verify access tokens.
    pub token_keys: TokenKeys,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
        }
    }
}

/// Middleware function that checks for a valid access token in the
/// `Authorization: Bearer` header.
///
/// The account ID is placed into the request and then the request executed
/// normally if the token is valid, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(account_id): Extension<AccountId>` to receive the account ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer =
        match TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &state).await {
            Ok(TypedHeader(Authorization(bearer))) => bearer,
            Err(error) => {
                tracing::debug!("missing or malformed authorization header: {error}");
                return Error::InvalidToken.into_response();
            }
        };

    let claims = match decode_token(bearer.token(), TokenType::Access, &state.token_keys) {
        Ok(claims) => claims,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(claims.account_id);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}
