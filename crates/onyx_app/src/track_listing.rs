//! Scrollable track listing for the album detail view

use crate::album::{Album, Track};
use onyx_core::{Color, DrawContext, Point, Rect, Size};
use onyx_text::{layout_multiline, multiline_height, TextMeasurer};

/// Font size of the artist, title and release lines
pub const KEY_FONT_SIZE: f32 = 16.0;

pub const DETAILS_FONT_SIZE: f32 = 13.0;

/// Empty border on every side
pub const BORDER: f32 = 6.0;

const SEPARATOR_DARK: Color = Color::rgb(44.0 / 255.0, 44.0 / 255.0, 44.0 / 255.0);
const SEPARATOR_DARKER: Color = Color::rgb(35.0 / 255.0, 35.0 / 255.0, 35.0 / 255.0);
const TRACK_TEXT: Color = Color::rgb(192.0 / 255.0, 192.0 / 255.0, 192.0 / 255.0);

#[derive(Debug, Clone)]
struct Header {
    artist: String,
    title: String,
    released: String,
}

/// Artist, title and release date over a list of tracks
#[derive(Debug, Clone, Default)]
pub struct TrackListing {
    header: Option<Header>,
    tracks: Vec<Track>,
}

impl TrackListing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_album(&mut self, album: &Album, tracks: Vec<Track>) {
        self.header = Some(Header {
            artist: album.artist.clone(),
            title: format!("\"{}\"", album.name),
            released: format!("Released {}", album.release_date),
        });
        self.tracks = tracks;
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn header_lines(&self) -> Option<[&str; 3]> {
        self.header
            .as_ref()
            .map(|h| [h.artist.as_str(), h.title.as_str(), h.released.as_str()])
    }

    /// Height needed to show everything at `width`; `None` until an album is set
    pub fn preferred_size(&self, width: f32, measurer: &dyn TextMeasurer) -> Option<Size> {
        let header = self.header_lines()?;
        let inner_width = width - 2.0 * BORDER;
        let key_height = measurer.line_metrics(KEY_FONT_SIZE).height();
        let details_height = measurer.line_metrics(DETAILS_FONT_SIZE).height();

        let mut height = key_height / 2.0;
        for (i, text) in header.iter().enumerate() {
            if i > 0 {
                height += key_height / 3.0;
            }
            height += multiline_height(text, measurer, KEY_FONT_SIZE, inner_width);
        }
        height += key_height / 2.0;

        height += details_height / 2.0;
        for track in &self.tracks {
            height += multiline_height(&track.title, measurer, DETAILS_FONT_SIZE, inner_width);
            height += details_height / 3.0;
        }
        Some(Size::new(width, height.floor()))
    }

    /// Preferred size of the scrolling viewport
    pub fn preferred_viewport_size(&self, width: f32, measurer: &dyn TextMeasurer) -> Option<Size> {
        self.preferred_size(width, measurer)
    }

    /// Scroll distance for page up/down
    pub fn block_increment(&self) -> f32 {
        30.0
    }

    /// Scroll distance for a single arrow step
    pub fn unit_increment(&self) -> f32 {
        10.0
    }

    /// The listing always matches the viewport width and scrolls vertically
    pub fn tracks_viewport_width(&self) -> bool {
        true
    }

    pub fn tracks_viewport_height(&self) -> bool {
        false
    }

    pub fn paint(&self, ctx: &mut dyn DrawContext, measurer: &dyn TextMeasurer, width: f32) {
        let Some(header) = self.header_lines() else {
            return;
        };
        let inner_width = width - 2.0 * BORDER;
        let key = measurer.line_metrics(KEY_FONT_SIZE);
        let key_height = key.height();
        let first_baseline = BORDER + 3.0 * key.ascent / 2.0;

        // Black band behind the header
        let mut band = first_baseline - key_height;
        for text in header {
            band += multiline_height(text, measurer, KEY_FONT_SIZE, inner_width);
            band += key_height / 3.0;
        }
        ctx.fill_rect(Rect::new(-4.0, 0.0, width + 1.0, band), Color::BLACK.into());

        let x = BORDER;
        let mut y = first_baseline;
        for text in header {
            y = paint_lines(ctx, measurer, text, KEY_FONT_SIZE, Color::WHITE, x, inner_width, y);
            y += key_height / 3.0;
        }

        let details_height = measurer.line_metrics(DETAILS_FONT_SIZE).height();
        y += details_height / 2.0;
        for track in &self.tracks {
            let rule = y - details_height;
            ctx.draw_line(
                Point::new(x + 5.0, rule + 2.0),
                Point::new(inner_width - 10.0, rule + 2.0),
                SEPARATOR_DARK,
            );
            ctx.draw_line(
                Point::new(x + 5.0, rule + 3.0),
                Point::new(inner_width - 10.0, rule + 3.0),
                SEPARATOR_DARKER,
            );
            y = paint_lines(
                ctx,
                measurer,
                &track.title,
                DETAILS_FONT_SIZE,
                TRACK_TEXT,
                x,
                inner_width,
                y,
            );
            y += details_height / 3.0;
        }
    }
}

/// Draw every wrapped line of `text`; returns the next baseline
#[allow(clippy::too_many_arguments)]
fn paint_lines(
    ctx: &mut dyn DrawContext,
    measurer: &dyn TextMeasurer,
    text: &str,
    font_size: f32,
    color: Color,
    x: f32,
    width: f32,
    y: f32,
) -> f32 {
    let layout = layout_multiline(text, measurer, font_size, x, width, y, None);
    for line in &layout.lines {
        ctx.draw_text(line.text(text), line.baseline, font_size, color);
    }
    layout.next_baseline
}

#[cfg(test)]
mod tests {
    use super::*;
    use onyx_core::{DisplayList, DrawCommand};
    use onyx_text::EstimatedTextMeasurer;

    fn listing() -> TrackListing {
        let mut listing = TrackListing::new();
        listing.set_album(
            &Album::new("Kind of Blue", "Miles Davis", "1959-08-17", "B000002ADT"),
            vec![Track::new("So What"), Track::new("Freddie Freeloader")],
        );
        listing
    }

    #[test]
    fn test_no_album_has_no_size_and_paints_nothing() {
        let listing = TrackListing::new();
        let measurer = EstimatedTextMeasurer::new();
        assert!(listing.preferred_size(300.0, &measurer).is_none());

        let mut list = DisplayList::new();
        listing.paint(&mut list, &measurer, 300.0);
        assert!(list.commands().is_empty());
    }

    #[test]
    fn test_preferred_size_on_wide_viewport() {
        let measurer = EstimatedTextMeasurer::new();
        let size = listing().preferred_size(1000.0, &measurer).unwrap();
        // key line 16, details line 13, nothing wraps
        let key = 16.0;
        let details = 13.0;
        let expected =
            key / 2.0 + 3.0 * key + 2.0 * key / 3.0 + key / 2.0 + details / 2.0 + 2.0 * (details + details / 3.0);
        assert_eq!(size.width, 1000.0);
        assert_eq!(size.height, f32::floor(expected));
    }

    #[test]
    fn test_narrow_viewport_grows_taller() {
        let measurer = EstimatedTextMeasurer::new();
        let wide = listing().preferred_size(1000.0, &measurer).unwrap();
        let narrow = listing().preferred_size(80.0, &measurer).unwrap();
        assert!(narrow.height > wide.height);
    }

    #[test]
    fn test_paint_order() {
        let measurer = EstimatedTextMeasurer::new();
        let mut list = DisplayList::new();
        listing().paint(&mut list, &measurer, 1000.0);

        assert!(matches!(list.commands()[0].1, DrawCommand::FillRect { .. }));
        assert_eq!(
            list.texts(),
            vec![
                "Miles Davis",
                "\"Kind of Blue\"",
                "Released 1959-08-17",
                "So What",
                "Freddie Freeloader"
            ]
        );
        let separators = list
            .commands()
            .iter()
            .filter(|(_, c)| matches!(c, DrawCommand::Line { .. }))
            .count();
        assert_eq!(separators, 4);
    }

    #[test]
    fn test_scrolling_contract() {
        let listing = listing();
        assert_eq!(listing.block_increment(), 30.0);
        assert_eq!(listing.unit_increment(), 10.0);
        assert!(listing.tracks_viewport_width());
        assert!(!listing.tracks_viewport_height());
    }
}
