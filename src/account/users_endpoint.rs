//! Defines the endpoints for reading, editing and deleting account records.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, Json,
    account::{
        Account, AccountId, AccountUpdate, delete_account, get_account, list_accounts,
        update_account,
    },
    auth::{ensure_self_or_staff, ensure_staff, get_caller},
    db::lock_connection,
};

/// The state needed to manage account records.
#[derive(Debug, Clone)]
pub struct UsersState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UsersState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that lists every account.
pub async fn list_users_endpoint(
    State(state): State<UsersState>,
    Extension(caller_id): Extension<AccountId>,
) -> Result<Json<Vec<Account>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    get_caller(caller_id, &connection)?;

    list_accounts(&connection).map(Json)
}

/// A route handler that gets a single account.
pub async fn get_user_endpoint(
    State(state): State<UsersState>,
    Extension(caller_id): Extension<AccountId>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<Account>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    get_caller(caller_id, &connection)?;

    get_account(account_id, &connection).map(Json)
}

/// A route handler for editing an account.
///
/// Accounts may rename themselves. Changing the role or the active flag
/// requires a staff account.
pub async fn edit_user_endpoint(
    State(state): State<UsersState>,
    Extension(caller_id): Extension<AccountId>,
    Path(account_id): Path<AccountId>,
    Json(update): Json<AccountUpdate>,
) -> Result<Json<Account>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let caller = get_caller(caller_id, &connection)?;

    ensure_self_or_staff(&caller, account_id)?;
    if update.role_id.is_some() || update.clear_role || update.is_active.is_some() {
        ensure_staff(&caller)?;
    }

    let account = update_account(account_id, update, &connection)?;
    tracing::info!("account {} edited account {}", caller.id, account.id);

    Ok(Json(account))
}

/// A route handler for deleting an account, responds with 204 No Content.
///
/// Accounts that are a party to any transaction cannot be deleted.
pub async fn delete_user_endpoint(
    State(state): State<UsersState>,
    Extension(caller_id): Extension<AccountId>,
    Path(account_id): Path<AccountId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let caller = get_caller(caller_id, &connection)?;

    ensure_self_or_staff(&caller, account_id)?;

    delete_account(account_id, &connection)
        .inspect_err(|error| tracing::info!("could not delete account {account_id}: {error}"))?;
    tracing::info!("account {} deleted account {account_id}", caller.id);

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod users_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        Error, Json,
        account::{Account, AccountId, AccountUpdate, NewAccount, create_account, get_account},
        auth::PasswordHash,
        db::initialize,
    };

    use super::{
        UsersState, delete_user_endpoint, edit_user_endpoint, get_user_endpoint,
        list_users_endpoint,
    };

    struct Fixture {
        state: UsersState,
        account: Account,
        other: Account,
        staff: Account,
    }

    fn new_account(name: &str, phone: &str, is_staff: bool) -> NewAccount {
        NewAccount {
            name: name.to_owned(),
            phone: phone.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            role_id: None,
            is_staff,
        }
    }

    fn get_fixture() -> Fixture {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let account = create_account(new_account("Ada", "1", false), &connection).unwrap();
        let other = create_account(new_account("Bob", "2", false), &connection).unwrap();
        let staff = create_account(new_account("Sam", "3", true), &connection).unwrap();

        Fixture {
            state: UsersState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            account,
            other,
            staff,
        }
    }

    #[tokio::test]
    async fn list_returns_all_accounts() {
        let fixture = get_fixture();

        let Json(accounts) =
            list_users_endpoint(State(fixture.state), Extension(fixture.account.id))
                .await
                .unwrap();

        assert_eq!(accounts, vec![fixture.account, fixture.other, fixture.staff]);
    }

    #[tokio::test]
    async fn get_returns_not_found_for_missing_account() {
        let fixture = get_fixture();

        let result = get_user_endpoint(
            State(fixture.state),
            Extension(fixture.account.id),
            Path(AccountId::new(42)),
        )
        .await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }

    #[tokio::test]
    async fn account_can_rename_itself() {
        let fixture = get_fixture();

        let Json(account) = edit_user_endpoint(
            State(fixture.state),
            Extension(fixture.account.id),
            Path(fixture.account.id),
            Json(AccountUpdate {
                name: Some("Ada Lovelace".to_owned()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(account.name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn account_cannot_edit_other_account() {
        let fixture = get_fixture();

        let result = edit_user_endpoint(
            State(fixture.state),
            Extension(fixture.other.id),
            Path(fixture.account.id),
            Json(AccountUpdate {
                name: Some("Mallory".to_owned()),
                ..Default::default()
            }),
        )
        .await;

        assert_eq!(result.err(), Some(Error::Forbidden));
    }

    #[tokio::test]
    async fn account_cannot_reactivate_itself() {
        let fixture = get_fixture();

        let result = edit_user_endpoint(
            State(fixture.state),
            Extension(fixture.account.id),
            Path(fixture.account.id),
            Json(AccountUpdate {
                is_active: Some(true),
                ..Default::default()
            }),
        )
        .await;

        assert_eq!(result.err(), Some(Error::Forbidden));
    }

    #[tokio::test]
    async fn account_cannot_clear_own_role() {
        let fixture = get_fixture();

        let result = edit_user_endpoint(
            State(fixture.state),
            Extension(fixture.account.id),
            Path(fixture.account.id),
            Json(AccountUpdate {
                clear_role: true,
                ..Default::default()
            }),
        )
        .await;

        assert_eq!(result.err(), Some(Error::Forbidden));
    }

    #[tokio::test]
    async fn staff_can_deactivate_account() {
        let fixture = get_fixture();

        let Json(account) = edit_user_endpoint(
            State(fixture.state),
            Extension(fixture.staff.id),
            Path(fixture.account.id),
            Json(AccountUpdate {
                is_active: Some(false),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert!(!account.is_active);
    }

    #[tokio::test]
    async fn account_can_delete_itself() {
        let fixture = get_fixture();

        let status = delete_user_endpoint(
            State(fixture.state.clone()),
            Extension(fixture.account.id),
            Path(fixture.account.id),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
        let connection = fixture.state.db_connection.lock().unwrap();
        assert_eq!(
            get_account(fixture.account.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn account_cannot_delete_other_account() {
        let fixture = get_fixture();

        let result = delete_user_endpoint(
            State(fixture.state),
            Extension(fixture.other.id),
            Path(fixture.account.id),
        )
        .await;

        assert_eq!(result.err(), Some(Error::Forbidden));
    }
}
