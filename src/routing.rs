//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::{
    AppState, Error,
    account::{
        delete_user_endpoint, edit_user_endpoint, get_user_endpoint, list_users_endpoint,
        register_endpoint,
    },
    auth::{auth_guard, post_log_in, post_token_refresh},
    endpoints,
    transaction::{
        create_transaction_endpoint, fraud_check_endpoint, get_transaction_endpoint,
        list_transactions_endpoint, review_transactions_endpoint, verify_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_endpoint))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::TOKEN_REFRESH, post(post_token_refresh));

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::REVIEW_TRANSACTIONS,
            get(review_transactions_endpoint),
        )
        .route(endpoints::TRANSACTION, get(get_transaction_endpoint))
        .route(
            endpoints::FRAUD_CHECK,
            patch(fraud_check_endpoint).put(fraud_check_endpoint),
        )
        .route(
            endpoints::VERIFY_TRANSACTION,
            patch(verify_transaction_endpoint),
        )
        .route(endpoints::USERS, get(list_users_endpoint))
        .route(
            endpoints::USER,
            get(get_user_endpoint)
                .patch(edit_user_endpoint)
                .delete(delete_user_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

#[cfg(test)]
mod api_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState,
        account::{NewAccount, create_account},
        auth::{LogInResponse, PasswordHash},
        endpoints::{self, format_endpoint},
        transaction::is_valid_reference,
    };

    use super::build_router;

    const STAFF_PHONE: &str = "0000000000";
    const PASSWORD: &str = "hunter2";

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        let state = AppState::new(connection, "foobar")
            .unwrap()
            .with_password_cost(4);

        {
            let connection = state.db_connection.lock().unwrap();
            create_account(
                NewAccount {
                    name: "Staff".to_owned(),
                    phone: STAFF_PHONE.to_owned(),
                    password_hash: PasswordHash::from_raw_password(PASSWORD, 4).unwrap(),
                    role_id: None,
                    is_staff: true,
                },
                &connection,
            )
            .unwrap();
        }

        TestServer::try_new(build_router(state)).unwrap()
    }

    async fn register(server: &TestServer, name: &str, phone: &str) -> Value {
        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({ "name": name, "phone": phone, "password": PASSWORD }))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()["user"].clone()
    }

    async fn log_in(server: &TestServer, phone: &str) -> LogInResponse {
        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "phone": phone, "password": PASSWORD }))
            .await;
        response.assert_status_ok();

        response.json()
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        let server = get_test_server();

        for path in [endpoints::TRANSACTIONS, endpoints::USERS] {
            server.get(path).await.assert_status_unauthorized();
        }
    }

    #[tokio::test]
    async fn refresh_token_is_not_a_bearer_token() {
        let server = get_test_server();
        register(&server, "Ada", "0211234567").await;
        let tokens = log_in(&server, "0211234567").await.tokens;

        server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&tokens.refresh)
            .await
            .assert_status_unauthorized();

        server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&tokens.access)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn refreshed_access_token_works() {
        let server = get_test_server();
        register(&server, "Ada", "0211234567").await;
        let tokens = log_in(&server, "0211234567").await.tokens;

        let response = server
            .post(endpoints::TOKEN_REFRESH)
            .json(&json!({ "refresh": tokens.refresh }))
            .await;
        response.assert_status_ok();
        let access = response.json::<Value>()["access"]
            .as_str()
            .unwrap()
            .to_owned();

        server
            .get(endpoints::USERS)
            .authorization_bearer(access)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn cash_in_then_transfer_then_fraud_check() {
        let server = get_test_server();
        register(&server, "Ada", "0211234567").await;
        let bob = register(&server, "Bob", "0217654321").await;
        let ada_token = log_in(&server, "0211234567").await.tokens.access;
        let bob_token = log_in(&server, "0217654321").await.tokens.access;
        let staff_token = log_in(&server, STAFF_PHONE).await.tokens.access;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&ada_token)
            .json(&json!({ "type": "CASH_IN", "step": 1, "amount": "50.00" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let cash_in: Value = response.json();
        assert_eq!(cash_in["oldbalanceOrg"], "0.00");
        assert_eq!(cash_in["newbalanceOrig"], "50.00");

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&ada_token)
            .json(&json!({
                "type": "TRANSFER",
                "step": 2,
                "amount": "10.00",
                "destination_id": bob["id"],
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let transfer: Value = response.json();
        let reference = transfer["reference"].as_str().unwrap().to_owned();
        assert!(is_valid_reference(&reference), "got {reference}");
        assert_eq!(transfer["origin"]["balance"], "40.00");
        assert_eq!(transfer["destination"]["balance"], "30.00");
        assert_ne!(cash_in["reference"], transfer["reference"]);

        // Bob sees the transfer he received.
        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&bob_token)
            .await;
        response.assert_status_ok();
        let bob_transactions: Value = response.json();
        assert_eq!(bob_transactions.as_array().unwrap().len(), 1);

        let fraud_check_path = format_endpoint(endpoints::FRAUD_CHECK, &reference);
        server
            .patch(&fraud_check_path)
            .authorization_bearer(&ada_token)
            .json(&json!({ "is_fraud": true, "confidence_score": 0.9 }))
            .await
            .assert_status_forbidden();

        let response = server
            .patch(&fraud_check_path)
            .authorization_bearer(&staff_token)
            .json(&json!({ "is_fraud": true, "confidence_score": 0.9, "reason": "mule" }))
            .await;
        response.assert_status_ok();
        let flagged: Value = response.json();
        assert_eq!(flagged["result_predicted"], "FRAUD");
        assert_eq!(flagged["is_fraud"], true);
        assert_eq!(flagged["fraud_flag_reason"], "mule");

        let response = server
            .put(&fraud_check_path)
            .authorization_bearer(&staff_token)
            .json(&json!({ "is_fraud": false, "confidence_score": 0.2 }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["result_predicted"], "LEGIT");

        server
            .patch(&fraud_check_path)
            .authorization_bearer(&staff_token)
            .json(&json!({ "is_fraud": true, "confidence_score": 1.5 }))
            .await
            .assert_status_bad_request();

        let response = server
            .get(&format_endpoint(endpoints::TRANSACTION, &reference))
            .authorization_bearer(&bob_token)
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["result_predicted"], "LEGIT");
    }

    #[tokio::test]
    async fn staff_review_listing_parses_query_filters() {
        let server = get_test_server();
        register(&server, "Ada", "0211234567").await;
        let ada_token = log_in(&server, "0211234567").await.tokens.access;
        let staff_token = log_in(&server, STAFF_PHONE).await.tokens.access;
        for (transaction_type, amount) in [("CASH_IN", "20.00"), ("CASH_OUT", "5.00")] {
            server
                .post(endpoints::TRANSACTIONS)
                .authorization_bearer(&ada_token)
                .json(&json!({ "type": transaction_type, "step": 1, "amount": amount }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server
            .get(endpoints::REVIEW_TRANSACTIONS)
            .add_query_param("type", "CASH_OUT")
            .add_query_param("is_verified", "false")
            .add_query_param("q", "ada")
            .authorization_bearer(&staff_token)
            .await;
        response.assert_status_ok();
        let transactions: Value = response.json();
        assert_eq!(transactions.as_array().unwrap().len(), 1);
        assert_eq!(transactions[0]["type"], "CASH_OUT");

        server
            .get(endpoints::REVIEW_TRANSACTIONS)
            .add_query_param("type", "BOGUS")
            .authorization_bearer(&staff_token)
            .await
            .assert_status_bad_request();

        server
            .get(endpoints::REVIEW_TRANSACTIONS)
            .authorization_bearer(&ada_token)
            .await
            .assert_status_forbidden();
    }

    #[tokio::test]
    async fn account_with_transactions_cannot_be_deleted() {
        let server = get_test_server();
        let ada = register(&server, "Ada", "0211234567").await;
        let token = log_in(&server, "0211234567").await.tokens.access;
        server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({ "type": "CASH_IN", "step": 1, "amount": "5.00" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .delete(&format_endpoint(endpoints::USER, &ada["id"]))
            .authorization_bearer(&token)
            .await;

        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn deleted_account_token_is_rejected() {
        let server = get_test_server();
        let ada = register(&server, "Ada", "0211234567").await;
        let token = log_in(&server, "0211234567").await.tokens.access;

        server
            .delete(&format_endpoint(endpoints::USER, &ada["id"]))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get(endpoints::USERS)
            .authorization_bearer(&token)
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let server = get_test_server();

        let response = server.get("/nope").await;

        response.assert_status_not_found();
        assert!(response.json::<Value>()["error"].is_string());
    }
}
