//! Application state management for Lumina.
//!
//! This module contains the core `App` struct that manages all application
//! state, including screen navigation, gallery filters, session management,
//! and background task coordination.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::api::client::{DEFAULT_COLOR_LIMIT, DEFAULT_SIMILAR_LIMIT};
use crate::api::{ApiClient, ApiError, ImageQuery, SessionExpired};
use crate::auth::{CredentialStore, ExpiryCoordinator, SessionController};
use crate::config::Config;
use crate::models::{
    ColorItem, ColorsResponse, Credentials, DeleteImageResponse, Image, ImageDetail,
    ImageMetadata, ImagePage, MetadataPatch, SimilarImagesResponse, SortBy, TagsResponse,
    UpdateMetadataResponse, UploadResponse,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Milliseconds of keyboard quiet time before a search term is sent.
const SEARCH_DEBOUNCE_MS: u64 = 500;

/// Maximum upload size per file.
const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// File extensions accepted for upload.
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 64;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Color facets offered when the popular-colors endpoint is unavailable.
const FALLBACK_COLORS: [&str; 8] = [
    "#EF4444", "#3B82F6", "#10B981", "#F59E0B", "#8B5CF6", "#F97316", "#1F2937", "#F3F4F6",
];

// ============================================================================
// UI State Types
// ============================================================================

/// Routable screens. All of them are protected: an unauthenticated app
/// always shows the login overlay first and remembers where it was headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Gallery,
    Detail,
    Similar,
}

/// Overall application state (active overlay/mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    EditingMetadata,
    Uploading,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Submit,
    ToggleMode,
}

/// Focused panel on the gallery screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryFocus {
    Images,
    Tags,
    Colors,
}

/// Focused field on the metadata edit overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Description,
    TagInput,
    ColorInput,
    Save,
}

/// Working copy of an image's metadata while the edit overlay is open.
pub struct EditForm {
    pub image_id: i64,
    pub description: String,
    pub tags: Vec<String>,
    pub colors: Vec<String>,
    pub tag_input: String,
    pub color_input: String,
    pub field: EditField,
    pub error: Option<String>,
    original: ImageMetadata,
}

impl EditForm {
    pub fn from_detail(detail: &ImageDetail) -> Self {
        Self {
            image_id: detail.image.id,
            description: detail.metadata.description.clone().unwrap_or_default(),
            tags: detail.metadata.tags.clone(),
            colors: detail.metadata.colors.clone(),
            tag_input: String::new(),
            color_input: String::new(),
            field: EditField::Description,
            error: None,
            original: detail.metadata.clone(),
        }
    }

    pub fn add_tag(&mut self) {
        let tag = self.tag_input.trim().to_string();
        if !tag.is_empty() && !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self.tag_input.clear();
    }

    pub fn add_color(&mut self) {
        let color = self.color_input.trim().to_string();
        if !color.is_empty() && !self.colors.contains(&color) {
            self.colors.push(color);
        }
        self.color_input.clear();
    }

    /// Patch containing only the fields that differ from the loaded
    /// metadata. An empty patch means there is nothing to save.
    pub fn to_patch(&self) -> MetadataPatch {
        let mut patch = MetadataPatch::default();

        let original_description = self.original.description.clone().unwrap_or_default();
        if self.description != original_description {
            patch.description = Some(self.description.clone());
        }
        if self.tags != self.original.tags {
            patch.tags = Some(self.tags.clone());
        }
        if self.colors != self.original.colors {
            patch.colors = Some(self.colors.clone());
        }

        patch
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            EditField::Description => EditField::TagInput,
            EditField::TagInput => EditField::ColorInput,
            EditField::ColorInput => EditField::Save,
            EditField::Save => EditField::Description,
        };
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Result types from background fetch tasks.
///
/// These variants are sent through an MPSC channel from spawned network
/// tasks back to the main application and applied once per UI tick.
enum FetchResult {
    /// One gallery page; `generation` identifies the query it answers
    Images {
        generation: u64,
        result: Result<ImagePage, String>,
    },
    /// Sidebar facet suggestions; either side may have failed
    Facets {
        tags: Option<TagsResponse>,
        colors: Option<ColorsResponse>,
    },
    /// Detail for a single image
    Detail {
        image_id: i64,
        result: Result<Box<ImageDetail>, String>,
    },
    /// Similarity results for a reference image
    Similar {
        image_id: i64,
        result: Result<SimilarImagesResponse, String>,
    },
    Deleted(Result<DeleteImageResponse, String>),
    MetadataUpdated(Result<Box<UpdateMetadataResponse>, String>),
    Uploaded(Result<UploadResponse, String>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub api: ApiClient,
    pub session: SessionController,
    pub expiry: ExpiryCoordinator,

    // Navigation
    pub state: AppState,
    pub screen: Screen,
    /// Protected screen attempted while unauthenticated; restored after login
    pending_screen: Option<Screen>,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    pub signup_mode: bool,

    // Gallery state
    pub images: Vec<Image>,
    pub gallery_selection: usize,
    pub page_number: u32,
    pub total_pages: u32,
    pub total_items: i64,
    pub search_query: String,
    pub selected_tags: Vec<String>,
    pub selected_colors: Vec<String>,
    pub sort_by: SortBy,
    pub gallery_focus: GalleryFocus,
    pub tag_options: Vec<String>,
    pub color_options: Vec<ColorItem>,
    pub tag_selection: usize,
    pub color_selection: usize,
    pub images_loading: bool,
    pub gallery_error: Option<String>,

    // Detail screen state
    pub detail: Option<ImageDetail>,
    pub detail_id: Option<i64>,
    pub detail_loading: bool,
    pub detail_error: Option<String>,

    // Similar screen state
    pub similar: Option<SimilarImagesResponse>,
    pub similar_selection: usize,
    pub similar_loading: bool,
    pub similar_error: Option<String>,

    // Overlay forms
    pub edit_form: Option<EditForm>,
    pub upload_input: String,
    pub upload_error: Option<String>,
    pub pending_delete: Option<i64>,

    // Search debounce and stale-result tracking
    search_dirty_at: Option<Instant>,
    images_generation: u64,

    // Background task channels
    fetch_rx: mpsc::Receiver<FetchResult>,
    fetch_tx: mpsc::Sender<FetchResult>,
    expired_rx: broadcast::Receiver<SessionExpired>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let credential_dir = config
            .credential_dir()
            .unwrap_or_else(|_| PathBuf::from("./credentials"));
        debug!(?credential_dir, "Credential store configured");

        let store = CredentialStore::new(credential_dir)?;
        let session = SessionController::bootstrap(store.clone());
        let api = ApiClient::new(config.base_url(), store.clone())?;
        let expired_rx = api.subscribe_session_expired();
        let expiry = ExpiryCoordinator::new(store.clone());

        let (fetch_tx, fetch_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_email = std::env::var("LUMINA_EMAIL")
            .ok()
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();
        let login_password = std::env::var("LUMINA_PASSWORD").unwrap_or_default();

        Ok(Self {
            config,
            api,
            session,
            expiry,

            state: AppState::Normal,
            screen: Screen::Gallery,
            pending_screen: None,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,
            signup_mode: false,

            images: Vec::new(),
            gallery_selection: 0,
            page_number: 1,
            total_pages: 0,
            total_items: 0,
            search_query: String::new(),
            selected_tags: Vec::new(),
            selected_colors: Vec::new(),
            sort_by: SortBy::Recent,
            gallery_focus: GalleryFocus::Images,
            tag_options: Vec::new(),
            color_options: Vec::new(),
            tag_selection: 0,
            color_selection: 0,
            images_loading: false,
            gallery_error: None,

            detail: None,
            detail_id: None,
            detail_loading: false,
            detail_error: None,

            similar: None,
            similar_selection: 0,
            similar_loading: false,
            similar_error: None,

            edit_form: None,
            upload_input: String::new(),
            upload_error: None,
            pending_delete: None,

            search_dirty_at: None,
            images_generation: 0,

            fetch_rx,
            fetch_tx,
            expired_rx,

            status_message: None,
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Show the login overlay, remembering the protected screen that was
    /// being headed for.
    pub fn start_login(&mut self) {
        self.pending_screen.get_or_insert(self.screen);
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    pub fn can_add_email_char(&self) -> bool {
        self.login_email.len() < MAX_EMAIL_LENGTH
    }

    pub fn can_add_password_char(&self) -> bool {
        self.login_password.len() < MAX_PASSWORD_LENGTH
    }

    /// Attempt login or signup with the credentials from the form.
    pub async fn attempt_auth(&mut self) {
        let email = self.login_email.trim().to_string();
        let password = self.login_password.clone();

        // Client-side validation: no network call for empty fields
        if email.is_empty() || password.is_empty() {
            self.login_error = Some("Email and password required".to_string());
            return;
        }

        self.login_error = None;
        let credentials = Credentials::new(email, password);

        let result = if self.signup_mode {
            self.session.signup(&self.api, &credentials).await
        } else {
            self.session.login(&self.api, &credentials).await
        };

        match result {
            Ok(message) => {
                self.config.last_email = Some(credentials.email.clone());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.login_password.clear();
                self.status_message = Some(message);
                self.state = AppState::Normal;

                // Route back to the screen attempted before login
                let target = self.pending_screen.take().unwrap_or(Screen::Gallery);
                self.screen = target;
                self.reload_current_screen();
            }
            Err(e) => {
                error!(error = %e, "Authentication failed");
                self.login_error = Some(friendly_auth_error(&e));
            }
        }
    }

    // =========================================================================
    // Session expiry prompt
    // =========================================================================

    /// The prompt's "continue session" action. On success the active
    /// screen's fetch is re-issued so the interrupted request runs again.
    pub async fn continue_session_from_prompt(&mut self) {
        let restored = self.expiry.continue_session(&self.api).await;
        if restored {
            self.status_message = Some("Session restored".to_string());
            self.reload_current_screen();
        }
    }

    /// The prompt's "log out" action: clear everything and show login.
    pub fn logout_from_prompt(&mut self) {
        self.expiry.log_out(&mut self.session);
        self.clear_loaded_data();
        self.screen = Screen::Gallery;
        self.pending_screen = None;
        self.status_message = Some("Logged out".to_string());
        self.start_login();
    }

    /// Explicit logout from the UI (outside the expiry prompt).
    pub fn logout(&mut self) {
        self.session.logout();
        self.clear_loaded_data();
        self.screen = Screen::Gallery;
        self.pending_screen = None;
        self.status_message = Some("Logged out".to_string());
        self.start_login();
    }

    fn clear_loaded_data(&mut self) {
        self.images.clear();
        self.gallery_selection = 0;
        self.total_items = 0;
        self.total_pages = 0;
        self.page_number = 1;
        self.detail = None;
        self.detail_id = None;
        self.similar = None;
        self.tag_options.clear();
        self.color_options.clear();
        self.selected_tags.clear();
        self.selected_colors.clear();
        self.search_query.clear();
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn open_detail(&mut self, image_id: i64) {
        self.screen = Screen::Detail;
        self.detail_id = Some(image_id);
        self.detail = None;
        self.detail_error = None;
        self.fetch_detail(image_id);
    }

    pub fn open_similar(&mut self) {
        if let Some(image_id) = self.detail_id {
            self.screen = Screen::Similar;
            self.similar = None;
            self.similar_selection = 0;
            self.similar_error = None;
            self.fetch_similar(image_id);
        }
    }

    pub fn back_to_gallery(&mut self) {
        self.screen = Screen::Gallery;
        self.detail = None;
        self.detail_id = None;
    }

    pub fn back_to_detail(&mut self) {
        self.screen = Screen::Detail;
        self.similar = None;
    }

    /// Re-issue the active screen's fetch from scratch. Used after a
    /// session refresh (in place of the web client's page reload) and for
    /// the manual refresh key.
    pub fn reload_current_screen(&mut self) {
        match self.screen {
            Screen::Gallery => {
                self.fetch_images();
                self.fetch_facets();
            }
            Screen::Detail => {
                if let Some(image_id) = self.detail_id {
                    self.fetch_detail(image_id);
                }
            }
            Screen::Similar => {
                if let Some(image_id) = self.detail_id {
                    self.fetch_similar(image_id);
                }
            }
        }
    }

    // =========================================================================
    // Gallery filters and search
    // =========================================================================

    fn current_query(&self) -> ImageQuery {
        ImageQuery {
            page_size: self.config.page_size(),
            page_number: self.page_number,
            search: self.search_query.clone(),
            tags: self.selected_tags.clone(),
            colors: self.selected_colors.clone(),
            sort_by: self.sort_by,
        }
    }

    /// Record a search edit; the fetch is issued after the debounce window.
    pub fn mark_search_dirty(&mut self) {
        self.search_dirty_at = Some(Instant::now());
        self.page_number = 1;
    }

    /// Cycle the sort order and refetch immediately.
    pub fn cycle_sort(&mut self) {
        self.sort_by = self.sort_by.next();
        self.page_number = 1;
        self.fetch_images();
    }

    pub fn toggle_selected_tag(&mut self) {
        if let Some(tag) = self.tag_options.get(self.tag_selection).cloned() {
            toggle_value(&mut self.selected_tags, tag);
            self.page_number = 1;
            self.fetch_images();
        }
    }

    pub fn toggle_selected_color(&mut self) {
        if let Some(color) = self
            .color_options
            .get(self.color_selection)
            .map(|c| c.color.clone())
        {
            toggle_value(&mut self.selected_colors, color);
            self.page_number = 1;
            self.fetch_images();
        }
    }

    pub fn clear_filters(&mut self) {
        if self.selected_tags.is_empty()
            && self.selected_colors.is_empty()
            && self.search_query.is_empty()
        {
            return;
        }
        self.selected_tags.clear();
        self.selected_colors.clear();
        self.search_query.clear();
        self.search_dirty_at = None;
        self.page_number = 1;
        self.fetch_images();
    }

    pub fn next_page(&mut self) {
        if self.page_number < self.total_pages {
            self.page_number += 1;
            self.fetch_images();
        }
    }

    pub fn prev_page(&mut self) {
        if self.page_number > 1 {
            self.page_number -= 1;
            self.fetch_images();
        }
    }

    pub fn selected_image(&self) -> Option<&Image> {
        self.images.get(self.gallery_selection)
    }

    // =========================================================================
    // Background fetches
    // =========================================================================

    /// Helper to send fetch results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<FetchResult>, result: FetchResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send fetch result - channel closed");
        }
    }

    /// Fetch the gallery page matching the current query. Responses to
    /// superseded queries are identified by generation and dropped.
    pub fn fetch_images(&mut self) {
        self.images_generation += 1;
        let generation = self.images_generation;
        let query = self.current_query();
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();

        self.images_loading = true;
        self.gallery_error = None;

        tokio::spawn(async move {
            let result = api.get_images(&query).await.map_err(|e| e.to_string());
            Self::send_result(&tx, FetchResult::Images { generation, result }).await;
        });
    }

    /// Fetch sidebar facet suggestions (recent tags, popular colors).
    pub fn fetch_facets(&mut self) {
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();

        tokio::spawn(async move {
            let (tags, colors) =
                tokio::join!(api.recent_tags(), api.popular_colors(DEFAULT_COLOR_LIMIT));

            let tags = match tags {
                Ok(t) => Some(t),
                Err(e) => {
                    debug!(error = %e, "Failed to fetch recent tags");
                    None
                }
            };
            let colors = match colors {
                Ok(c) => Some(c),
                Err(e) => {
                    debug!(error = %e, "Failed to fetch popular colors");
                    None
                }
            };

            Self::send_result(&tx, FetchResult::Facets { tags, colors }).await;
        });
    }

    pub fn fetch_detail(&mut self, image_id: i64) {
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        self.detail_loading = true;

        tokio::spawn(async move {
            let result = api
                .get_image(image_id)
                .await
                .map(Box::new)
                .map_err(|e| e.to_string());
            Self::send_result(&tx, FetchResult::Detail { image_id, result }).await;
        });
    }

    pub fn fetch_similar(&mut self, image_id: i64) {
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        self.similar_loading = true;

        tokio::spawn(async move {
            let result = api
                .similar_images(image_id, DEFAULT_SIMILAR_LIMIT)
                .await
                .map_err(|e| e.to_string());
            Self::send_result(&tx, FetchResult::Similar { image_id, result }).await;
        });
    }

    // =========================================================================
    // Mutations: delete, edit, upload
    // =========================================================================

    pub fn request_delete(&mut self) {
        if let Some(image_id) = self.detail_id {
            self.pending_delete = Some(image_id);
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub fn confirm_delete(&mut self) {
        let Some(image_id) = self.pending_delete.take() else {
            self.state = AppState::Normal;
            return;
        };
        self.state = AppState::Normal;

        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        info!(image_id, "Deleting image");

        tokio::spawn(async move {
            let result = api.delete_image(image_id).await.map_err(|e| e.to_string());
            Self::send_result(&tx, FetchResult::Deleted(result)).await;
        });
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.state = AppState::Normal;
    }

    pub fn open_edit(&mut self) {
        if let Some(ref detail) = self.detail {
            self.edit_form = Some(EditForm::from_detail(detail));
            self.state = AppState::EditingMetadata;
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit_form = None;
        self.state = AppState::Normal;
    }

    /// Save the edit form. An unchanged form is rejected locally without a
    /// network call.
    pub fn save_edit(&mut self) {
        let Some(ref mut form) = self.edit_form else {
            return;
        };

        let patch = form.to_patch();
        if patch.is_empty() {
            form.error = Some("No changes to save".to_string());
            return;
        }

        let image_id = form.image_id;
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        info!(image_id, "Updating image metadata");

        tokio::spawn(async move {
            let result = api
                .update_metadata(image_id, &patch)
                .await
                .map(Box::new)
                .map_err(|e| e.to_string());
            Self::send_result(&tx, FetchResult::MetadataUpdated(result)).await;
        });

        self.edit_form = None;
        self.state = AppState::Normal;
    }

    pub fn start_upload(&mut self) {
        self.state = AppState::Uploading;
        self.upload_input.clear();
        self.upload_error = None;
    }

    pub fn cancel_upload(&mut self) {
        self.upload_input.clear();
        self.upload_error = None;
        self.state = AppState::Normal;
    }

    /// Validate the entered paths and spawn the upload. Validation failures
    /// keep the overlay open; nothing is sent until every file passes.
    pub fn submit_upload(&mut self) {
        let paths: Vec<PathBuf> = self
            .upload_input
            .split_whitespace()
            .map(PathBuf::from)
            .collect();

        if paths.is_empty() {
            self.upload_error = Some("Enter one or more image paths".to_string());
            return;
        }

        for path in &paths {
            if let Err(message) = validate_upload_path(path) {
                self.upload_error = Some(message);
                return;
            }
        }

        self.upload_error = None;
        self.state = AppState::Normal;
        self.status_message = Some(format!(
            "Uploading {} file{}...",
            paths.len(),
            if paths.len() == 1 { "" } else { "s" }
        ));

        let api = self.api.clone();
        let tx = self.fetch_tx.clone();

        tokio::spawn(async move {
            let mut files = Vec::with_capacity(paths.len());
            for path in &paths {
                match tokio::fs::read(path).await {
                    Ok(data) => files.push((file_name_of(path), data)),
                    Err(e) => {
                        let message = format!("Failed to read {}: {}", path.display(), e);
                        Self::send_result(&tx, FetchResult::Uploaded(Err(message))).await;
                        return;
                    }
                }
            }

            let result = if files.len() == 1 {
                let (name, data) = files.remove(0);
                api.upload_image(&name, data).await
            } else {
                api.upload_images(files).await
            }
            .map_err(|e| e.to_string());

            Self::send_result(&tx, FetchResult::Uploaded(result)).await;
        });
    }

    // =========================================================================
    // Background task processing
    // =========================================================================

    /// Drain the session-expired broadcast and the fetch channel. Called
    /// once per UI tick.
    pub fn check_background_tasks(&mut self) {
        loop {
            match self.expired_rx.try_recv() {
                Ok(SessionExpired) => self.expiry.on_session_expired(),
                // A lagged receiver still means at least one 401 arrived
                Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    self.expiry.on_session_expired();
                }
                Err(_) => break,
            }
        }

        while let Ok(result) = self.fetch_rx.try_recv() {
            self.apply_fetch_result(result);
        }
    }

    /// Issue the debounced search fetch once the quiet window has elapsed.
    pub fn tick(&mut self) {
        if let Some(dirty_at) = self.search_dirty_at {
            if dirty_at.elapsed() >= Duration::from_millis(SEARCH_DEBOUNCE_MS) {
                self.search_dirty_at = None;
                self.fetch_images();
            }
        }
    }

    fn apply_fetch_result(&mut self, result: FetchResult) {
        match result {
            FetchResult::Images { generation, result } => {
                if generation != self.images_generation {
                    debug!(generation, "Discarding stale gallery response");
                    return;
                }
                self.images_loading = false;
                match result {
                    Ok(page) => {
                        self.apply_image_page(page);
                    }
                    Err(message) => {
                        self.gallery_error = Some(message.clone());
                        self.status_message = Some(format!("Failed to load images: {}", message));
                    }
                }
            }
            FetchResult::Facets { tags, colors } => {
                if let Some(tags) = tags {
                    self.tag_options = tags.tags;
                    self.tag_selection = self
                        .tag_selection
                        .min(self.tag_options.len().saturating_sub(1));
                }
                match colors {
                    Some(colors) => {
                        self.color_options = colors.colors;
                    }
                    None if self.color_options.is_empty() => {
                        // Fall back to the stock palette when the facet
                        // endpoint is unavailable
                        self.color_options = FALLBACK_COLORS
                            .iter()
                            .map(|c| ColorItem {
                                color: (*c).to_string(),
                                count: 0,
                            })
                            .collect();
                    }
                    None => {}
                }
                self.color_selection = self
                    .color_selection
                    .min(self.color_options.len().saturating_sub(1));
            }
            FetchResult::Detail { image_id, result } => {
                // Ignore results for a detail view no longer open
                if self.screen != Screen::Detail || self.detail_id != Some(image_id) {
                    debug!(image_id, "Discarding detail response for closed view");
                    return;
                }
                self.detail_loading = false;
                match result {
                    Ok(detail) => {
                        self.detail = Some(*detail);
                        self.detail_error = None;
                    }
                    Err(message) => {
                        self.detail_error = Some(message);
                    }
                }
            }
            FetchResult::Similar { image_id, result } => {
                if self.screen != Screen::Similar || self.detail_id != Some(image_id) {
                    debug!(image_id, "Discarding similar response for closed view");
                    return;
                }
                self.similar_loading = false;
                match result {
                    Ok(response) => {
                        self.similar_selection = 0;
                        self.similar = Some(response);
                        self.similar_error = None;
                    }
                    Err(message) => {
                        self.similar_error = Some(message);
                    }
                }
            }
            FetchResult::Deleted(result) => match result {
                Ok(response) => {
                    self.status_message = Some(response.message);
                    self.back_to_gallery();
                    self.fetch_images();
                }
                Err(message) => {
                    self.status_message = Some(format!("Delete failed: {}", message));
                }
            },
            FetchResult::MetadataUpdated(result) => match result {
                Ok(response) => {
                    self.status_message = Some(response.message.clone());
                    // Refresh the open detail view in place
                    if let Some(ref mut detail) = self.detail {
                        if detail.image.id == response.image_id {
                            detail.metadata = response.metadata.clone();
                        }
                    }
                }
                Err(message) => {
                    self.status_message = Some(format!("Update failed: {}", message));
                }
            },
            FetchResult::Uploaded(result) => match result {
                Ok(response) => {
                    self.status_message =
                        Some(response.message.unwrap_or_else(|| "Upload complete".to_string()));
                    if self.screen == Screen::Gallery {
                        self.fetch_images();
                    }
                }
                Err(message) => {
                    self.status_message = Some(format!("Upload failed: {}", message));
                }
            },
        }
    }

    fn apply_image_page(&mut self, page: ImagePage) {
        self.total_items = page.total_items;
        self.total_pages = page.total_pages;
        if page.page_number > 0 {
            self.page_number = page.page_number;
        }
        self.images = page.images;
        self.gallery_selection = self
            .gallery_selection
            .min(self.images.len().saturating_sub(1));
        self.gallery_error = None;
    }
}

/// Toggle membership of `value` in `list`.
fn toggle_value(list: &mut Vec<String>, value: String) {
    if let Some(position) = list.iter().position(|v| *v == value) {
        list.remove(position);
    } else {
        list.push(value);
    }
}

/// Map an authentication failure to a form-level message.
fn friendly_auth_error(error: &ApiError) -> String {
    match error {
        e if e.is_unauthorized() => "Invalid email or password".to_string(),
        ApiError::Network(e) if e.is_timeout() => {
            "Connection timed out. Please try again.".to_string()
        }
        ApiError::Network(_) => {
            "Unable to connect to server. Check your internet connection.".to_string()
        }
        e => e.to_string(),
    }
}

/// Client-side upload validation: image extension and size cap. No network
/// call is made for a rejected file.
fn validate_upload_path(path: &Path) -> Result<(), String> {
    let name = file_name_of(path);

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => return Err(format!("{}: not an image file", name)),
    }

    let metadata =
        std::fs::metadata(path).map_err(|_| format!("{}: file not found", name))?;
    if metadata.len() > MAX_UPLOAD_BYTES {
        return Err(format!("{}: file size exceeds 10MB", name));
    }

    Ok(())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn toggle_value_adds_then_removes() {
        let mut list = Vec::new();
        toggle_value(&mut list, "beach".to_string());
        assert_eq!(list, vec!["beach"]);
        toggle_value(&mut list, "beach".to_string());
        assert!(list.is_empty());
    }

    #[test]
    fn validate_upload_rejects_non_image_extension() {
        let err = validate_upload_path(Path::new("/tmp/notes.txt")).unwrap_err();
        assert_eq!(err, "notes.txt: not an image file");
    }

    #[test]
    fn validate_upload_rejects_missing_file() {
        let err = validate_upload_path(Path::new("/definitely/missing/pic.jpg")).unwrap_err();
        assert_eq!(err, "pic.jpg: file not found");
    }

    #[test]
    fn validate_upload_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_UPLOAD_BYTES + 1).unwrap();

        let err = validate_upload_path(&path).unwrap_err();
        assert_eq!(err, "big.png: file size exceeds 10MB");
    }

    #[test]
    fn validate_upload_accepts_small_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.jpeg");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"fake image bytes").unwrap();

        assert!(validate_upload_path(&path).is_ok());
    }

    #[test]
    fn edit_form_patch_contains_only_changes() {
        let detail: ImageDetail = serde_json::from_str(
            r#"{
                "id": 5, "filename": "a.png", "file_size": 10,
                "metadata": {"description": "old", "tags": ["x"], "colors": []}
            }"#,
        )
        .unwrap();

        let mut form = EditForm::from_detail(&detail);
        assert!(form.to_patch().is_empty());

        form.description = "new".to_string();
        form.tag_input = " fresh ".to_string();
        form.add_tag();

        let patch = form.to_patch();
        assert_eq!(patch.description.as_deref(), Some("new"));
        assert_eq!(patch.tags, Some(vec!["x".to_string(), "fresh".to_string()]));
        assert!(patch.colors.is_none());
    }

    #[test]
    fn edit_form_ignores_duplicate_and_blank_tags() {
        let detail: ImageDetail = serde_json::from_str(
            r#"{"id": 5, "filename": "a.png", "metadata": {"tags": ["x"]}}"#,
        )
        .unwrap();

        let mut form = EditForm::from_detail(&detail);
        form.tag_input = "x".to_string();
        form.add_tag();
        form.tag_input = "   ".to_string();
        form.add_tag();

        assert_eq!(form.tags, vec!["x"]);
        assert!(form.to_patch().is_empty());
    }
}
