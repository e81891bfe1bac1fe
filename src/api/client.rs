//! API client for communicating with the Lumina gallery REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! API requests to fetch, edit, upload, and search images.

use std::time::Duration;

use anyhow::Result;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::auth::CredentialStore;
use crate::models::{
    AuthResponse, ColorsResponse, Credentials, DeleteImageResponse, ImageDetail, ImagePage,
    MetadataPatch, SimilarImagesResponse, SortBy, TagsResponse, UpdateMetadataResponse,
    UploadResponse,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Capacity of the session-expired broadcast channel. Signals are consumed
/// every UI tick, so the buffer only has to absorb one burst of concurrent
/// 401 responses.
const SIGNAL_CHANNEL_CAPACITY: usize = 16;

/// Default number of similarity results requested.
pub const DEFAULT_SIMILAR_LIMIT: u32 = 6;

/// Default number of color facets requested.
pub const DEFAULT_COLOR_LIMIT: u32 = 10;

/// Default gallery page size.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Event published on the broadcast channel whenever any endpoint answers
/// with HTTP 401. One event per failed call; not deduplicated.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Query parameters for the paginated image listing.
#[derive(Debug, Clone)]
pub struct ImageQuery {
    pub page_size: u32,
    pub page_number: u32,
    pub search: String,
    pub tags: Vec<String>,
    pub colors: Vec<String>,
    pub sort_by: SortBy,
}

impl Default for ImageQuery {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_number: 1,
            search: String::new(),
            tags: Vec::new(),
            colors: Vec::new(),
            sort_by: SortBy::default(),
        }
    }
}

impl ImageQuery {
    /// Build the query string pairs for `GET /images`.
    ///
    /// Blank search terms, empty filter lists, and the default sort order
    /// are omitted; tag and color filters are comma-joined.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("pageSize", self.page_size.to_string()),
            ("pageNumber", self.page_number.to_string()),
        ];

        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search", search.to_string()));
        }
        if !self.tags.is_empty() {
            params.push(("tags", self.tags.join(",")));
        }
        if !self.colors.is_empty() {
            params.push(("colors", self.colors.join(",")));
        }
        if self.sort_by != SortBy::Recent {
            params.push(("sort_by", self.sort_by.as_param().to_string()));
        }

        params
    }
}

/// API client for the Lumina gallery service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: CredentialStore,
    expired_tx: broadcast::Sender<SessionExpired>,
}

impl ApiClient {
    /// Create a new API client against the given base URL.
    ///
    /// The credential store is consulted on every authenticated call, so
    /// token updates (login, refresh) are picked up without rebuilding the
    /// client.
    pub fn new(base_url: impl Into<String>, store: CredentialStore) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let (expired_tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
            expired_tx,
        })
    }

    /// Register a listener for session-expired events.
    pub fn subscribe_session_expired(&self) -> broadcast::Receiver<SessionExpired> {
        self.expired_tx.subscribe()
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Bearer header map from the current access token, if any. A call with
    /// no stored token proceeds unauthenticated and the server rejects it.
    fn bearer_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.store.auth_token() {
            match header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(e) => {
                    warn!(error = %e, "Stored access token is not a valid header value");
                }
            }
        }
        headers
    }

    /// Check if response is successful, normalizing the error body if not.
    ///
    /// A 401 publishes one session-expired event before the error is
    /// returned, regardless of which endpoint failed.
    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED {
            debug!("401 received, raising session-expired signal");
            // Fire and forget; no listener registered is fine
            let _ = self.expired_tx.send(SessionExpired);
        }

        Err(ApiError::from_response(status, &body))
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Issue a JSON request without a body (GET/DELETE), attaching the
    /// bearer token when present.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(endpoint);
        debug!(%method, %url, "API request");

        let response = self
            .client
            .request(method, &url)
            .headers(self.bearer_headers())
            .query(query)
            .send()
            .await?;

        let response = self.check(response).await?;
        Self::parse(response).await
    }

    /// Issue a JSON request with a body (POST/PATCH). Authentication
    /// endpoints pass `authed = false` and carry no bearer token.
    async fn request_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
        authed: bool,
    ) -> Result<T, ApiError> {
        let url = self.url(endpoint);
        debug!(%method, %url, authed, "API request");

        let mut builder = self.client.request(method, &url);
        if authed {
            builder = builder.headers(self.bearer_headers());
        }

        let response = builder.json(body).send().await?;
        let response = self.check(response).await?;
        Self::parse(response).await
    }

    // ===== Authentication =====

    /// Exchange credentials for tokens.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.request_json(Method::POST, "/auth/login", credentials, false)
            .await
    }

    /// Create an account; the response shape matches login.
    pub async fn signup(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.request_json(Method::POST, "/auth/signup", credentials, false)
            .await
    }

    /// Exchange a refresh token for a new access token. The server may
    /// rotate the refresh token; callers persist it only when returned.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthResponse, ApiError> {
        let body = serde_json::json!({ "refresh_token": refresh_token });
        self.request_json(Method::POST, "/auth/refresh", &body, false)
            .await
    }

    // ===== Image collection =====

    /// Fetch one page of the image collection.
    pub async fn get_images(&self, query: &ImageQuery) -> Result<ImagePage, ApiError> {
        self.request(Method::GET, "/images", &query.to_params()).await
    }

    /// Fetch a single image with its AI-derived metadata.
    pub async fn get_image(&self, image_id: i64) -> Result<ImageDetail, ApiError> {
        self.request(Method::GET, &format!("/images/{}", image_id), &[])
            .await
    }

    pub async fn delete_image(&self, image_id: i64) -> Result<DeleteImageResponse, ApiError> {
        self.request(Method::DELETE, &format!("/images/{}", image_id), &[])
            .await
    }

    /// Patch description/tags/colors; absent fields are left untouched.
    pub async fn update_metadata(
        &self,
        image_id: i64,
        patch: &MetadataPatch,
    ) -> Result<UpdateMetadataResponse, ApiError> {
        self.request_json(Method::PATCH, &format!("/images/{}", image_id), patch, true)
            .await
    }

    // ===== Uploads =====

    fn file_part(file_name: &str, data: Vec<u8>) -> Result<Part, ApiError> {
        let mut part = Part::bytes(data).file_name(file_name.to_string());
        if let Some(mime) = image_mime(file_name) {
            part = part
                .mime_str(mime)
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        }
        Ok(part)
    }

    async fn send_multipart(&self, endpoint: &str, form: Form) -> Result<UploadResponse, ApiError> {
        let url = self.url(endpoint);
        debug!(%url, "API upload");

        let response = self
            .client
            .post(&url)
            .headers(self.bearer_headers())
            .multipart(form)
            .send()
            .await?;

        let response = self.check(response).await?;
        Self::parse(response).await
    }

    /// Upload a single image as a multipart `file` field.
    pub async fn upload_image(
        &self,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<UploadResponse, ApiError> {
        let form = Form::new().part("file", Self::file_part(file_name, data)?);
        self.send_multipart("/images/upload", form).await
    }

    /// Upload multiple images as repeated multipart `files` fields.
    pub async fn upload_images(
        &self,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<UploadResponse, ApiError> {
        let mut form = Form::new();
        for (file_name, data) in files {
            form = form.part("files", Self::file_part(&file_name, data)?);
        }
        self.send_multipart("/images/upload/bulk", form).await
    }

    // ===== Facets and similarity =====

    /// Fetch tag suggestions for the filter sidebar.
    pub async fn recent_tags(&self) -> Result<TagsResponse, ApiError> {
        self.request(Method::GET, "/tags/recent", &[]).await
    }

    /// Fetch the most frequent colors across the collection.
    pub async fn popular_colors(&self, limit: u32) -> Result<ColorsResponse, ApiError> {
        self.request(
            Method::GET,
            "/colors/popular",
            &[("limit", limit.to_string())],
        )
        .await
    }

    /// Fetch visually similar images for a reference image.
    pub async fn similar_images(
        &self,
        image_id: i64,
        limit: u32,
    ) -> Result<SimilarImagesResponse, ApiError> {
        self.request(
            Method::GET,
            &format!("/images/{}/similar", image_id),
            &[("limit", limit.to_string())],
        )
        .await
    }
}

/// MIME type for an image file name, by extension.
fn image_mime(file_name: &str) -> Option<&'static str> {
    let ext = std::path::Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{serve, temp_store};
    use axum::http::HeaderMap;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn params(query: &ImageQuery) -> HashMap<&'static str, String> {
        query.to_params().into_iter().collect()
    }

    #[test]
    fn image_query_defaults_omit_filters() {
        let query = ImageQuery::default();
        let params = params(&query);
        assert_eq!(params.get("pageSize").map(String::as_str), Some("20"));
        assert_eq!(params.get("pageNumber").map(String::as_str), Some("1"));
        assert!(!params.contains_key("search"));
        assert!(!params.contains_key("tags"));
        assert!(!params.contains_key("colors"));
        assert!(!params.contains_key("sort_by"));
    }

    #[test]
    fn image_query_joins_filters_and_trims_search() {
        let query = ImageQuery {
            search: "  sunset  ".to_string(),
            tags: vec!["beach".to_string(), "sky".to_string()],
            colors: vec!["#EF4444".to_string()],
            sort_by: SortBy::NameAsc,
            ..ImageQuery::default()
        };
        let params = params(&query);
        assert_eq!(params.get("search").map(String::as_str), Some("sunset"));
        assert_eq!(params.get("tags").map(String::as_str), Some("beach,sky"));
        assert_eq!(params.get("colors").map(String::as_str), Some("#EF4444"));
        assert_eq!(params.get("sort_by").map(String::as_str), Some("a-z"));
    }

    #[test]
    fn image_query_blank_search_is_omitted() {
        let query = ImageQuery {
            search: "   ".to_string(),
            ..ImageQuery::default()
        };
        assert!(!params(&query).contains_key("search"));
    }

    #[test]
    fn image_mime_by_extension() {
        assert_eq!(image_mime("photo.JPG"), Some("image/jpeg"));
        assert_eq!(image_mime("photo.webp"), Some("image/webp"));
        assert_eq!(image_mime("archive.zip"), None);
        assert_eq!(image_mime("no_extension"), None);
    }

    #[tokio::test]
    async fn login_parses_auth_response() {
        let router = Router::new().route(
            "/auth/login",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["email"], "a@b.com");
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
        let api = ApiClient::new(base_url, store).expect("failed to build client");

        let response = api
            .login(&Credentials::new("a@b.com", "secret"))
            .await
            .expect("login failed");
        assert_eq!(response.access_token.as_deref(), Some("t1"));
        assert_eq!(response.message.as_deref(), Some("Login successful"));
    }

    #[tokio::test]
    async fn http_errors_carry_extracted_detail() {
        let router = Router::new().route(
            "/auth/login",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"detail": "Email already registered"})),
                )
            }),
        );
        let base_url = serve(router).await;
        let (_dir, store) = temp_store();
        let api = ApiClient::new(base_url, store).expect("failed to build client");

        let err = api
            .login(&Credentials::new("a@b.com", "secret"))
            .await
            .expect_err("expected failure");
        assert_eq!(err.to_string(), "Email already registered");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn unauthorized_emits_one_signal_per_call() {
        let router = Router::new().route(
            "/images",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"detail": "Token expired"})),
                )
            }),
        );
        let base_url = serve(router).await;
        let (_dir, store) = temp_store();
        let api = ApiClient::new(base_url, store).expect("failed to build client");
        let mut expired_rx = api.subscribe_session_expired();

        let err = api
            .get_images(&ImageQuery::default())
            .await
            .expect_err("expected 401");
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Token expired");

        // Exactly one signal for the failed call
        assert!(expired_rx.try_recv().is_ok());
        assert!(expired_rx.try_recv().is_err());

        // A second failing call emits a second signal
        let _ = api.get_images(&ImageQuery::default()).await;
        assert!(expired_rx.try_recv().is_ok());
        assert!(expired_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn non_401_errors_do_not_signal() {
        let router = Router::new().route(
            "/images",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base_url = serve(router).await;
        let (_dir, store) = temp_store();
        let api = ApiClient::new(base_url, store).expect("failed to build client");
        let mut expired_rx = api.subscribe_session_expired();

        let err = api
            .get_images(&ImageQuery::default())
            .await
            .expect_err("expected 500");
        assert_eq!(err.to_string(), "Internal Server Error");
        assert!(expired_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn authenticated_requests_attach_stored_bearer_token() {
        use axum::response::IntoResponse;

        let router = Router::new().route(
            "/images",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                if auth == "Bearer t-123" {
                    Json(json!({"images": [], "totalItems": 0, "pageNumber": 1,
                                "pageSize": 20, "totalPages": 0}))
                    .into_response()
                } else {
                    (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Missing token"})))
                        .into_response()
                }
            }),
        );

        let base_url = serve(router).await;
        let (_dir, store) = temp_store();
        let api = ApiClient::new(base_url, store.clone()).expect("failed to build client");

        // Without a token the call proceeds unauthenticated and the server
        // rejects it
        let err = api
            .get_images(&ImageQuery::default())
            .await
            .expect_err("expected rejection");
        assert!(err.is_unauthorized());

        store.set_auth_token("t-123").expect("failed to store token");
        let page = api
            .get_images(&ImageQuery::default())
            .await
            .expect("expected success with token");
        assert_eq!(page.total_items, 0);
    }

    #[tokio::test]
    async fn refresh_posts_the_refresh_token() {
        let router = Router::new().route(
            "/auth/refresh",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["refresh_token"], "r-9");
                Json(json!({"access_token": "t-new"}))
            }),
        );
        let base_url = serve(router).await;
        let (_dir, store) = temp_store();
        let api = ApiClient::new(base_url, store).expect("failed to build client");

        let response = api.refresh_session("r-9").await.expect("refresh failed");
        assert_eq!(response.access_token.as_deref(), Some("t-new"));
        assert!(response.refresh_token.is_none());
    }

    #[tokio::test]
    async fn network_failure_maps_to_network_error() {
        let (_dir, store) = temp_store();
        // Nothing listens on this port
        let api = ApiClient::new("http://127.0.0.1:9", store).expect("failed to build client");
        let err = api
            .get_images(&ImageQuery::default())
            .await
            .expect_err("expected network error");
        assert!(matches!(err, ApiError::Network(_)));
    }
}
