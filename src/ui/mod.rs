//! Terminal UI: rendering, input handling, and styling.

pub mod input;
pub mod render;
pub mod screens;
pub mod styles;
