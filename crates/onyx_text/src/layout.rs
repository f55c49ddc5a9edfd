//! Multiline text layout
//!
//! Lines are broken greedily at Unicode line-break opportunities (UAX #14).
//! A word wider than the available width is split between characters, and
//! mandatory breaks (newlines) always end a line.

use crate::measure::TextMeasurer;
use onyx_core::Point;
use std::ops::Range;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// One laid-out line
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Byte range into the source text, trailing whitespace excluded
    pub range: Range<usize>,
    /// Left end of the baseline
    pub baseline: Point,
    /// Measured width of the line
    pub width: f32,
}

impl TextLine {
    /// Slice of `source` this line shows
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range.clone()]
    }
}

/// Result of [`layout_multiline`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultilineLayout {
    pub lines: Vec<TextLine>,
    /// Baseline y for whatever is drawn after this block
    pub next_baseline: f32,
}

/// Break `text` into lines no wider than `max_width`
///
/// Returned ranges exclude the trailing whitespace and line terminators of
/// each line. Empty text yields no lines.
pub fn break_lines(
    text: &str,
    measurer: &dyn TextMeasurer,
    font_size: f32,
    max_width: f32,
) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    if text.is_empty() {
        return lines;
    }

    let mut start = 0;
    // Last allowed break that still fit on the current line
    let mut fit_end: Option<usize> = None;

    for (pos, opportunity) in linebreaks(text) {
        loop {
            let end = trim_end(text, start, pos);
            if end <= start || measurer.width(&text[start..end], font_size) <= max_width {
                break;
            }
            match fit_end.take() {
                Some(candidate) if candidate > start => {
                    lines.push(start..trim_end(text, start, candidate));
                    start = candidate;
                }
                _ => {
                    let split = fit_chars(text, start, end, measurer, font_size, max_width);
                    if split >= end {
                        // A lone character wider than the line stays as is
                        break;
                    }
                    tracing::trace!("break_lines: splitting word at byte {}", split);
                    lines.push(start..split);
                    start = split;
                }
            }
        }

        match opportunity {
            BreakOpportunity::Mandatory => {
                lines.push(start..trim_end(text, start, pos));
                start = pos;
                fit_end = None;
            }
            BreakOpportunity::Allowed => fit_end = Some(pos),
        }
    }

    lines
}

fn trim_end(text: &str, start: usize, end: usize) -> usize {
    start + text[start..end].trim_end().len()
}

/// End of the longest prefix of `text[start..end]` that fits, at least one char
fn fit_chars(
    text: &str,
    start: usize,
    end: usize,
    measurer: &dyn TextMeasurer,
    font_size: f32,
    max_width: f32,
) -> usize {
    let mut width = 0.0;
    let mut split = start;
    for (offset, ch) in text[start..end].char_indices() {
        let advance = measurer.advance(ch, font_size);
        if split > start && width + advance > max_width {
            break;
        }
        width += advance;
        split = start + offset + ch.len_utf8();
    }
    split
}

/// Height of `text` wrapped to `max_width`
///
/// The first line takes its full height and every following line adds one
/// ascent. Empty text has no height.
pub fn multiline_height(
    text: &str,
    measurer: &dyn TextMeasurer,
    font_size: f32,
    max_width: f32,
) -> f32 {
    let count = break_lines(text, measurer, font_size, max_width).len();
    if count == 0 {
        return 0.0;
    }
    let metrics = measurer.line_metrics(font_size);
    metrics.height() + (count - 1) as f32 * metrics.ascent
}

/// Lay out `text` starting with its first baseline at `(x, y)`
///
/// Each following baseline sits one ascent lower. `max_lines` of `None`
/// (or zero) places every line; otherwise layout stops after that many.
pub fn layout_multiline(
    text: &str,
    measurer: &dyn TextMeasurer,
    font_size: f32,
    x: f32,
    max_width: f32,
    y: f32,
    max_lines: Option<usize>,
) -> MultilineLayout {
    let ascent = measurer.line_metrics(font_size).ascent;
    let limit = match max_lines {
        Some(0) | None => usize::MAX,
        Some(n) => n,
    };

    let mut baseline_y = y;
    let mut lines = Vec::new();
    for range in break_lines(text, measurer, font_size, max_width)
        .into_iter()
        .take(limit)
    {
        let width = measurer.width(&text[range.clone()], font_size);
        lines.push(TextLine {
            range,
            baseline: Point::new(x, baseline_y),
            width,
        });
        baseline_y += ascent;
    }

    MultilineLayout {
        lines,
        next_baseline: baseline_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::EstimatedTextMeasurer;

    // 10px per character at font size 10
    fn mono() -> EstimatedTextMeasurer {
        EstimatedTextMeasurer::with_advance(1.0)
    }

    fn texts<'a>(text: &'a str, ranges: &[Range<usize>]) -> Vec<&'a str> {
        ranges.iter().map(|r| &text[r.clone()]).collect()
    }

    #[test]
    fn test_word_wrap() {
        let text = "hello world";
        let lines = break_lines(text, &mono(), 10.0, 60.0);
        assert_eq!(texts(text, &lines), vec!["hello", "world"]);
    }

    #[test]
    fn test_fits_on_one_line() {
        let text = "The Wall";
        let lines = break_lines(text, &mono(), 10.0, 1000.0);
        assert_eq!(texts(text, &lines), vec!["The Wall"]);
    }

    #[test]
    fn test_long_word_breaks_between_characters() {
        let text = "abcdefghij";
        let lines = break_lines(text, &mono(), 10.0, 40.0);
        assert_eq!(texts(text, &lines), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_narrow_width_still_progresses() {
        let text = "abc";
        let lines = break_lines(text, &mono(), 10.0, 1.0);
        assert_eq!(texts(text, &lines), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_newline_forces_break() {
        let text = "one\ntwo";
        let lines = break_lines(text, &mono(), 10.0, 1000.0);
        assert_eq!(texts(text, &lines), vec!["one", "two"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(break_lines("", &mono(), 10.0, 100.0).is_empty());
        assert_eq!(multiline_height("", &mono(), 10.0, 100.0), 0.0);
        let layout = layout_multiline("", &mono(), 10.0, 0.0, 100.0, 25.0, None);
        assert!(layout.lines.is_empty());
        assert_eq!(layout.next_baseline, 25.0);
    }

    #[test]
    fn test_multiline_height() {
        // ascent 8, height 10
        assert_eq!(multiline_height("hello", &mono(), 10.0, 100.0), 10.0);
        assert_eq!(multiline_height("hello world", &mono(), 10.0, 60.0), 18.0);
    }

    #[test]
    fn test_layout_advances_by_ascent_and_honors_max_lines() {
        let text = "aa bb cc dd";
        let layout = layout_multiline(text, &mono(), 10.0, 5.0, 30.0, 20.0, Some(2));
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[0].text(text), "aa");
        assert_eq!(layout.lines[0].baseline, Point::new(5.0, 20.0));
        assert_eq!(layout.lines[1].text(text), "bb");
        assert_eq!(layout.lines[1].baseline, Point::new(5.0, 28.0));
        assert_eq!(layout.lines[1].width, 20.0);
        assert_eq!(layout.next_baseline, 36.0);

        let all = layout_multiline(text, &mono(), 10.0, 5.0, 30.0, 20.0, Some(0));
        assert_eq!(all.lines.len(), 4);
    }
}
