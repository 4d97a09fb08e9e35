mod core;
mod register_endpoint;
mod users_endpoint;

pub use core::{
    Account, AccountId, AccountUpdate, MAX_NAME_LENGTH, MAX_PHONE_LENGTH, NewAccount,
    authenticate, create_account, create_account_table, delete_account, find_credentials,
    get_account, list_accounts, prepare_registration, register_account, update_account,
    verify_credentials,
};
pub(crate) use core::set_balance;
pub use register_endpoint::{RegisterRequest, RegisterResponse, register_endpoint};
pub use users_endpoint::{
    delete_user_endpoint, edit_user_endpoint, get_user_endpoint, list_users_endpoint,
};
