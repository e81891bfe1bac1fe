//! REST API client module for the Lumina gallery service.
//!
//! This module provides the `ApiClient` for communicating with the
//! gallery API: authentication, the paginated image collection,
//! metadata editing, uploads, facet suggestions, and similarity search.
//!
//! The API uses JWT bearer token authentication; the access token is
//! read from the credential store at call time. Every 401 response
//! publishes a `SessionExpired` event on a broadcast channel before the
//! error is returned to the caller.

pub mod client;
pub mod error;

pub use client::{ApiClient, ImageQuery, SessionExpired};
pub use error::ApiError;
