// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::Deserialize;

/// One color facet with its occurrence count across the collection.
#[derive(Debug, Clone, Deserialize)]
pub struct ColorItem {
    pub color: String,
    #[serde(default)]
    pub count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColorsResponse {
    #[serde(default)]
    pub colors: Vec<ColorItem>,
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub count: i64,
}

/// A similarity-search hit for a reference image.
#[derive(Debug, Clone, Deserialize)]
pub struct SimilarImage {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub similarity_percentage: f64,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SimilarImage {
    /// Display name falling back to the raw filename.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.filename)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimilarImagesResponse {
    pub reference_image_id: i64,
    #[serde(default)]
    pub similar_images: Vec<SimilarImage>,
    #[serde(default)]
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similar_images_response_parses() {
        let json = r#"{
            "reference_image_id": 9,
            "similar_images": [
                {"id": 4, "filename": "dunes.jpg", "display_name": "Dunes",
                 "similarity_percentage": 87.5, "tags": ["desert"], "colors": []}
            ],
            "count": 1
        }"#;

        let parsed: SimilarImagesResponse = serde_json::from_str(json).expect("failed to parse");
        assert_eq!(parsed.reference_image_id, 9);
        assert_eq!(parsed.similar_images[0].name(), "Dunes");
        assert!((parsed.similar_images[0].similarity_percentage - 87.5).abs() < f64::EPSILON);
    }

    #[test]
    fn similar_image_name_falls_back_to_filename() {
        let parsed: SimilarImage =
            serde_json::from_str(r#"{"id": 1, "filename": "x.png"}"#).expect("failed to parse");
        assert_eq!(parsed.name(), "x.png");
    }
}
