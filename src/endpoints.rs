//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/users/{account_id}/', use [format_endpoint].

/// The route for registering a new account.
pub const REGISTER: &str = "/register/";
/// The route for exchanging a phone number and password for a token pair.
pub const LOG_IN: &str = "/login/";
/// The route for exchanging a refresh token for a new access token.
pub const TOKEN_REFRESH: &str = "/token/refresh/";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/transactions/";
/// The staff route to search every transaction for review.
pub const REVIEW_TRANSACTIONS: &str = "/transactions/review/";
/// The route to a single transaction.
pub const TRANSACTION: &str = "/transactions/{reference}/";
/// The route for setting the predicted result of a transaction.
pub const FRAUD_CHECK: &str = "/transactions/{reference}/fraud-check/";
/// The route for marking a transaction as verified by an agent.
pub const VERIFY_TRANSACTION: &str = "/transactions/{reference}/verify/";
/// The route to list accounts.
pub const USERS: &str = "/users/";
/// The route to a single account.
pub const USER: &str = "/users/{account_id}/";

/// Replace the parameter in `endpoint_path` with `value`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{account_id}/', '{account_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, value: impl std::fmt::Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        value,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::REGISTER);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN);
        assert_endpoint_is_valid_uri(endpoints::TOKEN_REFRESH);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::REVIEW_TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::FRAUD_CHECK);
        assert_endpoint_is_valid_uri(endpoints::VERIFY_TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::USERS);
        assert_endpoint_is_valid_uri(endpoints::USER);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint(endpoints::FRAUD_CHECK, "TRX-20250101-ABC123");

        assert_eq!(
            formatted_path,
            "/transactions/TRX-20250101-ABC123/fraud-check/"
        );
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
