//! Drawing surface interface
//!
//! Tiles paint through [`DrawContext`], implemented by the host's visual
//! tree. Compositing state (opacity) is scoped: [`OpacityScope`] pushes on
//! creation and pops on drop, so a paint routine can't leak state into its
//! siblings even on early return.
//!
//! [`DisplayList`] is a headless implementation that records commands with
//! their effective opacity resolved.

use crate::geometry::{Brush, Color, CornerRadius, Point, Rect};
use std::ops::{Deref, DerefMut};

/// Painting operations a tile may issue
pub trait DrawContext {
    /// Push an opacity value (multiplied with parent)
    fn push_opacity(&mut self, opacity: f32);

    /// Pop the top opacity from the stack
    fn pop_opacity(&mut self);

    fn fill_rect(&mut self, rect: Rect, brush: Brush);

    fn fill_rounded_rect(&mut self, rect: Rect, radius: CornerRadius, brush: Brush);

    fn stroke_rounded_rect(&mut self, rect: Rect, radius: CornerRadius, width: f32, brush: Brush);

    fn draw_line(&mut self, from: Point, to: Point, color: Color);

    /// Draw straight-alpha RGBA8 pixels into `rect`
    fn draw_image(&mut self, rect: Rect, pixels: &[u8], pixel_width: u32, pixel_height: u32);

    /// Draw a single line of text with its baseline at `baseline`
    fn draw_text(&mut self, text: &str, baseline: Point, font_size: f32, color: Color);
}

/// Opacity pushed for the lifetime of the guard
pub struct OpacityScope<'a, C: DrawContext + ?Sized> {
    ctx: &'a mut C,
}

impl<'a, C: DrawContext + ?Sized> OpacityScope<'a, C> {
    pub fn new(ctx: &'a mut C, opacity: f32) -> Self {
        ctx.push_opacity(opacity);
        Self { ctx }
    }
}

impl<C: DrawContext + ?Sized> Deref for OpacityScope<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.ctx
    }
}

impl<C: DrawContext + ?Sized> DerefMut for OpacityScope<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.ctx
    }
}

impl<C: DrawContext + ?Sized> Drop for OpacityScope<'_, C> {
    fn drop(&mut self) {
        self.ctx.pop_opacity();
    }
}

/// A recorded draw operation
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    FillRect {
        rect: Rect,
        brush: Brush,
    },
    FillRoundedRect {
        rect: Rect,
        radius: CornerRadius,
        brush: Brush,
    },
    StrokeRoundedRect {
        rect: Rect,
        radius: CornerRadius,
        width: f32,
        brush: Brush,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
    },
    Image {
        rect: Rect,
        pixel_width: u32,
        pixel_height: u32,
    },
    Text {
        text: String,
        baseline: Point,
        font_size: f32,
        color: Color,
    },
}

/// Headless recorder: each command is stored with the opacity in effect
#[derive(Debug, Default)]
pub struct DisplayList {
    commands: Vec<(f32, DrawCommand)>,
    opacity_stack: Vec<f32>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opacity currently in effect (product of the stack)
    pub fn current_opacity(&self) -> f32 {
        self.opacity_stack.last().copied().unwrap_or(1.0)
    }

    /// Depth of the opacity stack; zero once every scope is released
    pub fn opacity_depth(&self) -> usize {
        self.opacity_stack.len()
    }

    pub fn commands(&self) -> &[(f32, DrawCommand)] {
        &self.commands
    }

    /// All text drawn, in paint order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|(_, cmd)| match cmd {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Images drawn, with their effective opacity
    pub fn images(&self) -> Vec<(f32, Rect)> {
        self.commands
            .iter()
            .filter_map(|(opacity, cmd)| match cmd {
                DrawCommand::Image { rect, .. } => Some((*opacity, *rect)),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, command: DrawCommand) {
        let opacity = self.current_opacity();
        self.commands.push((opacity, command));
    }
}

impl DrawContext for DisplayList {
    fn push_opacity(&mut self, opacity: f32) {
        let combined = self.current_opacity() * opacity.clamp(0.0, 1.0);
        self.opacity_stack.push(combined);
    }

    fn pop_opacity(&mut self) {
        self.opacity_stack.pop();
    }

    fn fill_rect(&mut self, rect: Rect, brush: Brush) {
        self.record(DrawCommand::FillRect { rect, brush });
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: CornerRadius, brush: Brush) {
        self.record(DrawCommand::FillRoundedRect {
            rect,
            radius,
            brush,
        });
    }

    fn stroke_rounded_rect(&mut self, rect: Rect, radius: CornerRadius, width: f32, brush: Brush) {
        self.record(DrawCommand::StrokeRoundedRect {
            rect,
            radius,
            width,
            brush,
        });
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color) {
        self.record(DrawCommand::Line { from, to, color });
    }

    fn draw_image(&mut self, rect: Rect, _pixels: &[u8], pixel_width: u32, pixel_height: u32) {
        self.record(DrawCommand::Image {
            rect,
            pixel_width,
            pixel_height,
        });
    }

    fn draw_text(&mut self, text: &str, baseline: Point, font_size: f32, color: Color) {
        self.record(DrawCommand::Text {
            text: text.to_string(),
            baseline,
            font_size,
            color,
        });
    }
}
