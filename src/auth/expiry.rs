use tracing::{info, warn};

use crate::api::ApiClient;

use super::{CredentialStore, SessionController};

/// Error shown when "continue session" is chosen with no refresh token
/// stored.
const MISSING_REFRESH_TOKEN_MESSAGE: &str = "No refresh token found. Please log in again.";

/// Visibility state of the session-expired prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    Hidden,
    Shown,
    Refreshing,
    LoggedOut,
}

/// Handler for the session-expired broadcast.
///
/// Presents a blocking choice: exchange the refresh token for a new access
/// token, or clear the session. Repeated signals while the prompt is
/// visible are no-ops, so a burst of concurrent 401 responses surfaces a
/// single prompt.
pub struct ExpiryCoordinator {
    store: CredentialStore,
    state: PromptState,
    error: Option<String>,
}

impl ExpiryCoordinator {
    pub fn new(store: CredentialStore) -> Self {
        Self {
            store,
            state: PromptState::Hidden,
            error: None,
        }
    }

    pub fn state(&self) -> PromptState {
        self.state
    }

    /// True while the prompt must be rendered and must capture all input.
    pub fn is_visible(&self) -> bool {
        self.state != PromptState::Hidden
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// React to a session-expired event. Only a hidden coordinator
    /// transitions; signals received while visible are dropped.
    pub fn on_session_expired(&mut self) {
        if self.state == PromptState::Hidden {
            info!("Session expired, prompting for refresh or logout");
            self.state = PromptState::Shown;
            self.error = None;
        }
    }

    /// The "continue session" action.
    ///
    /// Requires a refresh token in the store; without one a local error is
    /// recorded and the prompt stays shown. With one, the refresh endpoint
    /// is called: success persists the new access token (and rotated
    /// refresh token when returned) and hides the prompt; failure records
    /// the error message and stays shown for another attempt.
    ///
    /// Returns true when the session was restored, so the caller can
    /// re-issue the interrupted fetch.
    pub async fn continue_session(&mut self, api: &ApiClient) -> bool {
        if self.state != PromptState::Shown {
            return false;
        }

        let Some(refresh_token) = self.store.refresh_token() else {
            self.error = Some(MISSING_REFRESH_TOKEN_MESSAGE.to_string());
            return false;
        };

        self.state = PromptState::Refreshing;
        self.error = None;

        match api.refresh_session(&refresh_token).await {
            Ok(response) => {
                if let Some(ref token) = response.access_token {
                    if let Err(e) = self.store.set_auth_token(token) {
                        warn!(error = %e, "Failed to persist refreshed access token");
                    }
                }
                // Refresh token rotation is optional per response
                if let Some(ref token) = response.refresh_token {
                    if let Err(e) = self.store.set_refresh_token(token) {
                        warn!(error = %e, "Failed to persist rotated refresh token");
                    }
                }
                info!("Session restored");
                self.state = PromptState::Hidden;
                true
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed");
                self.error = Some(e.to_string());
                self.state = PromptState::Shown;
                false
            }
        }
    }

    /// The "log out" action: clear the session and hide the prompt. The
    /// caller is responsible for navigating to the login screen.
    pub fn log_out(&mut self, session: &mut SessionController) {
        self.state = PromptState::LoggedOut;
        session.logout();
        self.state = PromptState::Hidden;
        self.error = None;
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
    fn repeated_signals_surface_a_single_prompt() {
        let (_dir, store) = temp_store();
        let mut coordinator = ExpiryCoordinator::new(store);
        assert_eq!(coordinator.state(), PromptState::Hidden);

        coordinator.on_session_expired();
        assert_eq!(coordinator.state(), PromptState::Shown);

        // One signal per concurrent 401; repeats while shown are no-ops
        coordinator.on_session_expired();
        coordinator.on_session_expired();
        assert_eq!(coordinator.state(), PromptState::Shown);
    }

    #[tokio::test]
    async fn continue_without_refresh_token_reports_locally_and_stays_shown() {
        let (_dir, store) = temp_store();
        let api = ApiClient::new("http://127.0.0.1:9", store.clone()).unwrap();
        let mut coordinator = ExpiryCoordinator::new(store);
        coordinator.on_session_expired();

        let restored = coordinator.continue_session(&api).await;
        assert!(!restored);
        assert_eq!(coordinator.state(), PromptState::Shown);
        assert_eq!(
            coordinator.error(),
            Some("No refresh token found. Please log in again.")
        );
    }

    #[tokio::test]
    async fn continue_with_valid_token_replaces_access_token_and_hides() {
        let router = Router::new().route(
            "/auth/refresh",
            post(|| async { Json(json!({"access_token": "t-new"})) }),
        );
        let base_url = serve(router).await;
        let (_dir, store) = temp_store();
        store.set_auth_token("t-old").unwrap();
        store.set_refresh_token("r1").unwrap();

        let api = ApiClient::new(base_url, store.clone()).unwrap();
        let mut coordinator = ExpiryCoordinator::new(store.clone());
        coordinator.on_session_expired();

        let restored = coordinator.continue_session(&api).await;
        assert!(restored);
        assert_eq!(coordinator.state(), PromptState::Hidden);
        assert_eq!(store.auth_token().as_deref(), Some("t-new"));
        // No rotation in the response, the old refresh token stays
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_persisted() {
        let router = Router::new().route(
            "/auth/refresh",
            post(|| async {
                Json(json!({"access_token": "t-new", "refresh_token": "r-new"}))
            }),
        );
        let base_url = serve(router).await;
        let (_dir, store) = temp_store();
        store.set_refresh_token("r-old").unwrap();

        let api = ApiClient::new(base_url, store.clone()).unwrap();
        let mut coordinator = ExpiryCoordinator::new(store.clone());
        coordinator.on_session_expired();

        assert!(coordinator.continue_session(&api).await);
        assert_eq!(store.refresh_token().as_deref(), Some("r-new"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_prompt_shown_with_the_error() {
        let router = Router::new().route(
            "/auth/refresh",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"detail": "Refresh token expired"})),
                )
            }),
        );
        let base_url = serve(router).await;
        let (_dir, store) = temp_store();
        store.set_refresh_token("r-stale").unwrap();

        let api = ApiClient::new(base_url, store.clone()).unwrap();
        let mut coordinator = ExpiryCoordinator::new(store);
        coordinator.on_session_expired();

        let restored = coordinator.continue_session(&api).await;
        assert!(!restored);
        assert_eq!(coordinator.state(), PromptState::Shown);
        assert_eq!(coordinator.error(), Some("Refresh token expired"));
    }

    #[test]
    fn log_out_clears_the_session_and_hides() {
        let (_dir, store) = temp_store();
        store.set_auth_token("t1").unwrap();
        store.set_refresh_token("r1").unwrap();

        let mut session = SessionController::bootstrap(store.clone());
        let mut coordinator = ExpiryCoordinator::new(store.clone());
        coordinator.on_session_expired();

        coordinator.log_out(&mut session);
        assert_eq!(coordinator.state(), PromptState::Hidden);
        assert!(!session.is_authenticated());
        assert!(store.is_empty());

        // A later 401 can reopen the prompt
        coordinator.on_session_expired();
        assert_eq!(coordinator.state(), PromptState::Shown);
    }
}
