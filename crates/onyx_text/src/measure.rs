//! Text measurement
//!
//! Layout only needs two things from a font: per-line vertical metrics
//! and per-character advances. Rendering backends implement
//! [`TextMeasurer`] over their real font data; [`EstimatedTextMeasurer`]
//! covers headless use and tests.

/// Vertical metrics for one line at a given font size
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineMetrics {
    /// Distance from the top of the line to the baseline
    pub ascent: f32,
    /// Distance from the baseline to the bottom of the line (positive)
    pub descent: f32,
    /// Extra gap between lines
    pub leading: f32,
}

impl LineMetrics {
    /// Full height of one line
    pub fn height(&self) -> f32 {
        self.ascent + self.descent + self.leading
    }
}

/// Source of font metrics for layout
pub trait TextMeasurer: Send + Sync {
    fn line_metrics(&self, font_size: f32) -> LineMetrics;

    /// Horizontal advance of a single character
    fn advance(&self, ch: char, font_size: f32) -> f32;

    /// Width of a run of text laid out on one line
    fn width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().map(|ch| self.advance(ch, font_size)).sum()
    }
}

/// Fixed-ratio measurer that needs no font data
///
/// Every visible character advances by `advance_ratio * font_size`.
/// Newlines have no width.
#[derive(Debug, Clone, Copy)]
pub struct EstimatedTextMeasurer {
    pub advance_ratio: f32,
    pub ascent_ratio: f32,
    pub descent_ratio: f32,
    pub leading_ratio: f32,
}

impl Default for EstimatedTextMeasurer {
    fn default() -> Self {
        Self {
            advance_ratio: 0.55,
            ascent_ratio: 0.8,
            descent_ratio: 0.2,
            leading_ratio: 0.0,
        }
    }
}

impl EstimatedTextMeasurer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Measurer where every character is exactly `advance_ratio` ems wide
    pub fn with_advance(advance_ratio: f32) -> Self {
        Self {
            advance_ratio,
            ..Self::default()
        }
    }
}

impl TextMeasurer for EstimatedTextMeasurer {
    fn line_metrics(&self, font_size: f32) -> LineMetrics {
        LineMetrics {
            ascent: font_size * self.ascent_ratio,
            descent: font_size * self.descent_ratio,
            leading: font_size * self.leading_ratio,
        }
    }

    fn advance(&self, ch: char, font_size: f32) -> f32 {
        if ch == '\n' || ch == '\r' {
            0.0
        } else {
            font_size * self.advance_ratio
        }
    }
}
