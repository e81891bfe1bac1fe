//! Data models for the Lumina gallery API.
//!
//! This module contains all the data structures used to represent
//! gallery data including:
//!
//! - `User`, `Credentials`, `AuthResponse`: authentication types
//! - `Image`, `ImageDetail`, `ImagePage`: the image collection
//! - `ImageMetadata`, `MetadataPatch`: AI-derived metadata and edits
//! - Facet types: `TagsResponse`, `ColorsResponse`
//! - Similarity types: `SimilarImage`, `SimilarImagesResponse`

pub mod facets;
pub mod image;
pub mod user;

pub use facets::{ColorItem, ColorsResponse, SimilarImage, SimilarImagesResponse, TagsResponse};
pub use image::{
    DeleteImageResponse, Image, ImageDetail, ImageMetadata, ImagePage, MetadataPatch, SortBy,
    UpdateMetadataResponse, UploadResponse,
};
pub use user::{AuthResponse, Credentials, User};
