//! Screen-specific rendering for the main content area.

pub mod detail;
pub mod gallery;
pub mod similar;
