// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// The authenticated account as cached alongside the tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
}

/// Email/password pair submitted to `/auth/login` and `/auth/signup`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Response shape shared by login, signup, and refresh.
///
/// Every field is optional on the wire; the server may omit any of them
/// (e.g. refresh responses without token rotation carry no refresh_token).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<User>,
    pub message: Option<String>,
    pub expires_in: Option<i64>,
}
