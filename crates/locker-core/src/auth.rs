use std::path::Path;

use crate::session;
use crate::store::UserStore;

/// Authentication state: logged out, or logged in as a named account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    LoggedOut,
    LoggedIn(String),
}

/// Login failure. Deliberately the same message for an unknown username
/// and a wrong password.
#[derive(Debug, Clone)]
pub struct AuthError;

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid username or password")
    }
}

impl std::error::Error for AuthError {}

/// Attempt a login: exact, case-sensitive password match. On success the
/// session marker records the username.
pub fn login(store: &UserStore, username: &str, password: &str) -> anyhow::Result<AuthState> {
    match store.account(username) {
        Some(account) if account.password == password => {
            session::set(store.data_dir(), username)?;
            Ok(AuthState::LoggedIn(username.to_string()))
        }
        _ => Err(AuthError.into()),
    }
}

/// Explicit logout: clear the session marker.
pub fn logout(data_dir: &Path) -> anyhow::Result<AuthState> {
    session::clear(data_dir)?;
    Ok(AuthState::LoggedOut)
}

/// Resume from an existing session marker. The marker is trusted; the
/// password is not re-validated.
pub fn resume(data_dir: &Path) -> AuthState {
    match session::load(data_dir) {
        Some(username) => AuthState::LoggedIn(username),
        None => AuthState::LoggedOut,
    }
}
