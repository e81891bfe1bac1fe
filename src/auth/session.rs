use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{AuthResponse, Credentials, User};

use super::CredentialStore;

/// Fallback message when a login response carries none.
const DEFAULT_LOGIN_MESSAGE: &str = "Login successful";

/// Fallback message when a signup response carries none.
const DEFAULT_SIGNUP_MESSAGE: &str = "Account created successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthState {
    Authenticated,
    Unauthenticated,
}

/// Owner of in-memory authentication state.
///
/// Bootstraps from the credential store exactly once, at construction:
/// both an access token and a parseable user record must be present to
/// start authenticated. A token without a user record (possible, since
/// slot writes are independent) starts unauthenticated.
pub struct SessionController {
    store: CredentialStore,
    state: AuthState,
    user: Option<User>,
}

impl SessionController {
    pub fn bootstrap(store: CredentialStore) -> Self {
        let has_token = store.auth_token().is_some();
        let user = store.user();

        let (state, user) = if has_token && user.is_some() {
            (AuthState::Authenticated, user)
        } else {
            (AuthState::Unauthenticated, None)
        };

        debug!(authenticated = state == AuthState::Authenticated, "Session bootstrapped");
        Self { store, state, user }
    }

    /// Exchange credentials for a session.
    ///
    /// On success the returned tokens and user record are persisted (each
    /// slot independently) and the human-readable message is returned. On
    /// failure nothing is written and the state is unchanged.
    pub async fn login(
        &mut self,
        api: &ApiClient,
        credentials: &Credentials,
    ) -> Result<String, ApiError> {
        let response = api.login(credentials).await?;
        info!(email = %credentials.email, "Login successful");
        Ok(self.apply_auth_response(response, DEFAULT_LOGIN_MESSAGE))
    }

    /// Create an account; on success behaves exactly like `login`.
    pub async fn signup(
        &mut self,
        api: &ApiClient,
        credentials: &Credentials,
    ) -> Result<String, ApiError> {
        let response = api.signup(credentials).await?;
        info!(email = %credentials.email, "Account created");
        Ok(self.apply_auth_response(response, DEFAULT_SIGNUP_MESSAGE))
    }

    fn apply_auth_response(&mut self, response: AuthResponse, default_message: &str) -> String {
        if let Some(ref token) = response.access_token {
            if let Err(e) = self.store.set_auth_token(token) {
                warn!(error = %e, "Failed to persist access token");
            }
        }
        if let Some(ref token) = response.refresh_token {
            if let Err(e) = self.store.set_refresh_token(token) {
                warn!(error = %e, "Failed to persist refresh token");
            }
        }
        if let Some(ref user) = response.user {
            if let Err(e) = self.store.set_user(user) {
                warn!(error = %e, "Failed to persist user record");
            }
            self.user = Some(user.clone());
        }

        self.state = AuthState::Authenticated;
        response
            .message
            .unwrap_or_else(|| default_message.to_string())
    }

    /// Clear all credential slots and reset to unauthenticated.
    /// Unconditional; storage failures are logged inside the store.
    pub fn logout(&mut self) {
        info!("Logging out");
        self.store.clear();
        self.state = AuthState::Unauthenticated;
        self.user = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{serve, temp_store};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    #[test]
    fn bootstrap_with_token_and_user_is_authenticated() {
        let (_dir, store) = temp_store();
        store.set_auth_token("t1").unwrap();
        store
            .set_user(&User {
                id: "1".to_string(),
                email: "a@b.com".to_string(),
            })
            .unwrap();

        let session = SessionController::bootstrap(store);
        assert!(session.is_authenticated());
        assert_eq!(session.user().map(|u| u.email.as_str()), Some("a@b.com"));
    }

    #[test]
    fn bootstrap_with_token_but_no_user_is_unauthenticated() {
        let (_dir, store) = temp_store();
        store.set_auth_token("t1").unwrap();

        let session = SessionController::bootstrap(store);
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }

    #[test]
    fn bootstrap_with_user_but_no_token_is_unauthenticated() {
        let (_dir, store) = temp_store();
        store
            .set_user(&User {
                id: "1".to_string(),
                email: "a@b.com".to_string(),
            })
            .unwrap();

        let session = SessionController::bootstrap(store);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn successful_login_persists_all_slots_and_resolves_message() {
        let router = Router::new().route(
            "/auth/login",
            post(|| async {
                Json(json!({
                    "access_token": "t1",
                    "refresh_token": "r1",
                    "user": {"id": "1", "email": "a@b.com"},
                    "message": "Login successful"
                }))
            }),
        );
        let base_url = serve(router).await;
        let (_dir, store) = temp_store();
        let api = ApiClient::new(base_url, store.clone()).unwrap();
        let mut session = SessionController::bootstrap(store.clone());

        let message = session
            .login(&api, &Credentials::new("a@b.com", "secret"))
            .await
            .expect("login failed");

        assert_eq!(message, "Login successful");
        assert!(session.is_authenticated());
        assert_eq!(store.auth_token().as_deref(), Some("t1"));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));
        assert_eq!(store.user().map(|u| u.id), Some("1".to_string()));
    }

    #[tokio::test]
    async fn failed_login_writes_nothing() {
        let router = Router::new().route(
            "/auth/login",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"detail": "Invalid credentials"})),
                )
            }),
        );
        let base_url = serve(router).await;
        let (_dir, store) = temp_store();
        let api = ApiClient::new(base_url, store.clone()).unwrap();
        let mut session = SessionController::bootstrap(store.clone());

        let err = session
            .login(&api, &Credentials::new("a@b.com", "wrong"))
            .await
            .expect_err("expected failure");

        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(!session.is_authenticated());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn login_without_message_uses_default() {
        let router = Router::new().route(
            "/auth/login",
            post(|| async { Json(json!({"access_token": "t1"})) }),
        );
        let base_url = serve(router).await;
        let (_dir, store) = temp_store();
        let api = ApiClient::new(base_url, store.clone()).unwrap();
        let mut session = SessionController::bootstrap(store);

        let message = session
            .login(&api, &Credentials::new("a@b.com", "secret"))
            .await
            .expect("login failed");
        assert_eq!(message, "Login successful");
    }

    #[tokio::test]
    async fn signup_without_message_uses_default() {
        let router = Router::new().route(
            "/auth/signup",
            post(|| async { Json(json!({"access_token": "t1"})) }),
        );
        let base_url = serve(router).await;
        let (_dir, store) = temp_store();
        let api = ApiClient::new(base_url, store.clone()).unwrap();
        let mut session = SessionController::bootstrap(store);

        let message = session
            .signup(&api, &Credentials::new("a@b.com", "secret"))
            .await
            .expect("signup failed");
        assert_eq!(message, "Account created successfully");
        assert!(session.is_authenticated());
    }

    #[test]
    fn logout_clears_every_slot_regardless_of_prior_state() {
        let (_dir, store) = temp_store();
        store.set_auth_token("t1").unwrap();
        store.set_refresh_token("r1").unwrap();
        store
            .set_user(&User {
                id: "1".to_string(),
                email: "a@b.com".to_string(),
            })
            .unwrap();

        let mut session = SessionController::bootstrap(store.clone());
        assert!(session.is_authenticated());

        session.logout();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert!(store.is_empty());

        // Logout from an already-unauthenticated state is still a no-op
        session.logout();
        assert!(store.is_empty());
    }
}
