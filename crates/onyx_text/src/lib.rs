//! Text layout for Onyx tiles and listings
//!
//! This crate provides:
//! - Font metrics through the [`TextMeasurer`] trait
//! - Unicode line breaking with a per-character fallback for long words
//! - Multiline layout where each baseline sits one ascent below the last

pub mod layout;
pub mod measure;

pub use layout::{break_lines, layout_multiline, multiline_height, MultilineLayout, TextLine};
pub use measure::{EstimatedTextMeasurer, LineMetrics, TextMeasurer};
