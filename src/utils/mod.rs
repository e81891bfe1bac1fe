//! Utility functions for string and value formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{color_name, format_file_size, format_upload_age, truncate};
