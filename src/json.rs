//! A JSON extractor and response that reports malformed request bodies the
//! same way as every other validation error.

use axum::{
    extract::{FromRequest, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::Error;

/// Wraps [axum::Json] so that a body that cannot be deserialized becomes an
/// [Error::InvalidField] for the `body` field instead of a plain text 422.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("rejected request body: {rejection}");

        Error::invalid_field("body", rejection.body_text())
    }
}
