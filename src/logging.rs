//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
        request, response,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// The number of characters of a body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values never appear in the logs.
const REDACTED_FIELDS: [&str; 3] = ["password", "access", "refresh"];
const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords and tokens in JSON bodies and the `Authorization` header are
/// redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    log_request(&parts, &display_body(&parts.headers, &body_bytes));

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log_response(&parts, &display_body(&parts.headers, &body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

fn display_body(headers: &HeaderMap, body: &Bytes) -> String {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/json"));

    if is_json && let Ok(mut json) = serde_json::from_slice::<Value>(body) {
        redact_secrets(&mut json);
        return json.to_string();
    }

    String::from_utf8_lossy(body).to_string()
}

fn redact_secrets(json: &mut Value) {
    match json {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *value = Value::String(REDACTED.to_owned());
                } else {
                    redact_secrets(value);
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(redact_secrets),
        _ => {}
    }
}

/// The first [LOG_BODY_LENGTH_LIMIT] characters of `body`, or `None` if the
/// body is short enough to log in full.
fn truncate(body: &str) -> Option<&str> {
    body.char_indices()
        .nth(LOG_BODY_LENGTH_LIMIT)
        .map(|(end, _)| &body[..end])
}

/// The method, URI, version and headers of a request with the bearer token
/// replaced.
fn display_request_parts(parts: &request::Parts) -> String {
    let mut headers = parts.headers.clone();
    if headers.contains_key(AUTHORIZATION) {
        headers.insert(AUTHORIZATION, HeaderValue::from_static(REDACTED));
    }

    format!(
        "{} {} {:?}\nheaders: {headers:#?}",
        parts.method, parts.uri, parts.version
    )
}

fn log_request(parts: &request::Parts, body: &str) {
    let parts = display_request_parts(parts);

    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Received request: {parts}\nbody: {truncated}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Received request: {parts}\nbody: {body:?}"),
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Sending response: {parts:#?}\nbody: {truncated}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {parts:#?}\nbody: {body:?}"),
    }
}

#[cfg(test)]
mod logging_tests {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use axum::{
        Json, Router,
        extract::Request,
        http::{
            HeaderMap, HeaderValue,
            header::{AUTHORIZATION, CONTENT_TYPE},
        },
        middleware,
        routing::post,
    };
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use tracing_subscriber::fmt::MakeWriter;

    use super::{
        LOG_BODY_LENGTH_LIMIT, display_body, display_request_parts, logging_middleware, truncate,
    };

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    #[test]
    fn redacts_passwords_and_tokens() {
        let body = json!({
            "phone": "0211234567",
            "password": "hunter2",
            "nested": { "access": "a.b.c", "refresh": "d.e.f" },
        })
        .to_string();

        let display = display_body(&json_headers(), &body.into());

        assert!(!display.contains("hunter2"), "got {display}");
        assert!(!display.contains("a.b.c"), "got {display}");
        assert!(!display.contains("d.e.f"), "got {display}");
        assert!(display.contains("0211234567"), "got {display}");
    }

    #[test]
    fn redacts_bearer_token_header() {
        let (parts, _) = Request::builder()
            .uri("/transactions/")
            .header(AUTHORIZATION, "Bearer very.secret.token")
            .header(CONTENT_TYPE, "application/json")
            .body(())
            .unwrap()
            .into_parts();

        let display = display_request_parts(&parts);

        assert!(!display.contains("very.secret.token"), "got {display}");
        assert!(display.contains("authorization"), "got {display}");
        assert!(display.contains("/transactions/"), "got {display}");
        assert!(display.contains("application/json"), "got {display}");
        // The request itself keeps the token for the auth guard.
        assert_eq!(
            parts.headers[AUTHORIZATION],
            HeaderValue::from_static("Bearer very.secret.token")
        );
    }

    #[test]
    fn leaves_non_json_bodies_alone() {
        let display = display_body(&HeaderMap::new(), &"password=hunter2".into());

        assert_eq!(display, "password=hunter2");
    }

    #[test]
    fn truncates_on_char_boundary() {
        let short = "é".repeat(LOG_BODY_LENGTH_LIMIT);
        let long = "é".repeat(LOG_BODY_LENGTH_LIMIT + 1);

        assert_eq!(truncate(&short), None);
        assert_eq!(truncate(&long), Some(short.as_str()));
    }

    #[tokio::test]
    async fn passes_bodies_through_unchanged() {
        let app = Router::new()
            .route("/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).unwrap();
        let body = json!({ "password": "hunter2" });

        let response = server.post("/echo").json(&body).await;

        response.assert_status_ok();
        response.assert_json(&body);
    }

    /// Collects formatted log lines so tests can inspect them.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn bearer_token_never_reaches_info_logs() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = Router::new()
            .route("/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).unwrap();

        server
            .post("/echo")
            .authorization_bearer("very.secret.token")
            .json(&json!({ "refresh": "another.secret.token" }))
            .await
            .assert_status_ok();

        let logs = logs.contents();
        assert!(logs.contains("Received request"), "got {logs}");
        assert!(!logs.contains("very.secret.token"), "got {logs}");
        assert!(!logs.contains("another.secret.token"), "got {logs}");
    }
}
