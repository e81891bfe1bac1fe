// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// A single image as returned in gallery listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub original_path: Option<String>,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
}

/// AI-derived metadata attached to an image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageMetadata {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub ai_processing_status: Option<String>,
}

/// Full image detail: the listing fields plus metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageDetail {
    #[serde(flatten)]
    pub image: Image,
    #[serde(default)]
    pub metadata: ImageMetadata,
}

/// One page of the image collection.
///
/// The listing endpoint reports pagination in camelCase.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImagePage {
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(rename = "totalItems", default)]
    pub total_items: i64,
    #[serde(rename = "pageNumber", default)]
    pub page_number: u32,
    #[serde(rename = "pageSize", default)]
    pub page_size: u32,
    #[serde(rename = "totalPages", default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteImageResponse {
    pub message: String,
    pub image_id: i64,
}

/// Partial metadata update; absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetadataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
}

impl MetadataPatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.tags.is_none() && self.colors.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMetadataResponse {
    pub message: String,
    pub image_id: i64,
    pub metadata: ImageMetadata,
}

/// Upload responses vary between the single and bulk endpoints; only the
/// human-readable message is consumed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Gallery sort order. `Recent` is the server default and is omitted from
/// the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Recent,
    Oldest,
    NameAsc,
    NameDesc,
}

impl SortBy {
    /// Wire value for the `sort_by` query parameter.
    pub fn as_param(self) -> &'static str {
        match self {
            SortBy::Recent => "recent",
            SortBy::Oldest => "oldest",
            SortBy::NameAsc => "a-z",
            SortBy::NameDesc => "z-a",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortBy::Recent => "Recent",
            SortBy::Oldest => "Oldest",
            SortBy::NameAsc => "Name A-Z",
            SortBy::NameDesc => "Name Z-A",
        }
    }

    /// Cycle to the next sort order (wrapping around).
    pub fn next(self) -> Self {
        match self {
            SortBy::Recent => SortBy::Oldest,
            SortBy::Oldest => SortBy::NameAsc,
            SortBy::NameAsc => SortBy::NameDesc,
            SortBy::NameDesc => SortBy::Recent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_page_parses_camel_case_pagination() {
        let json = r#"{
            "images": [
                {"id": 7, "filename": "sunset.jpg", "file_size": 123456,
                 "thumbnail_url": "/thumbs/7.jpg", "original_url": "/img/7.jpg",
                 "uploaded_at": "2026-07-01T12:00:00Z"}
            ],
            "totalItems": 41,
            "pageNumber": 2,
            "pageSize": 20,
            "totalPages": 3
        }"#;

        let page: ImagePage = serde_json::from_str(json).expect("failed to parse");
        assert_eq!(page.images.len(), 1);
        assert_eq!(page.images[0].filename, "sunset.jpg");
        assert_eq!(page.total_items, 41);
        assert_eq!(page.page_number, 2);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn image_detail_flattens_listing_fields() {
        let json = r##"{
            "id": 3, "filename": "cat.png", "file_size": 2048,
            "metadata": {
                "description": "a cat",
                "tags": ["cat", "pet"],
                "colors": ["#1F2937"],
                "ai_processing_status": "completed"
            }
        }"##;

        let detail: ImageDetail = serde_json::from_str(json).expect("failed to parse");
        assert_eq!(detail.image.id, 3);
        assert_eq!(detail.metadata.tags, vec!["cat", "pet"]);
        assert_eq!(detail.metadata.ai_processing_status.as_deref(), Some("completed"));
    }

    #[test]
    fn metadata_patch_skips_absent_fields() {
        let patch = MetadataPatch {
            description: Some("new".to_string()),
            tags: None,
            colors: None,
        };
        let json = serde_json::to_string(&patch).expect("failed to serialize");
        assert_eq!(json, r#"{"description":"new"}"#);
        assert!(!patch.is_empty());
        assert!(MetadataPatch::default().is_empty());
    }

    #[test]
    fn sort_by_cycles_through_all_orders() {
        let mut sort = SortBy::Recent;
        for _ in 0..4 {
            sort = sort.next();
        }
        assert_eq!(sort, SortBy::Recent);
        assert_eq!(SortBy::NameDesc.as_param(), "z-a");
    }
}
