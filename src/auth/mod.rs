mod log_in;
mod middleware;
mod password;
mod policy;
mod refresh;
mod token;

pub use log_in::{LogInRequest, LogInResponse, LogInState, post_log_in};
pub use middleware::{AuthState, auth_guard};
pub use password::{PasswordHash, ValidatedPassword};
pub use policy::{ensure_self_or_staff, ensure_staff, get_caller};
pub use refresh::{RefreshRequest, RefreshResponse, post_token_refresh};
pub use token::{
    Claims, DEFAULT_ACCESS_TOKEN_DURATION, DEFAULT_REFRESH_TOKEN_DURATION, TokenKeys, TokenPair,
    TokenType, decode_token, encode_token, issue_token_pair,
};
