//! Onyx Core
//!
//! Foundational types shared by the Onyx tile crates:
//!
//! - **Geometry & Color**: points, sizes, rects, colors, gradients and brushes
//! - **Animatable Elements**: typed property tokens that timelines write through
//! - **Repaint Coalescing**: at most one repaint request per element per frame
//! - **Drawing Surface**: the painting collaborator a tile renders into
//! - **Events**: pointer, resize and hierarchy events delivered to tiles
//!
//! # Example
//!
//! ```rust
//! use onyx_core::{ElementId, RepaintQueue};
//!
//! let mut queue = RepaintQueue::new();
//! let tile = ElementId::new(7);
//!
//! // Two timelines touching the same tile in one frame
//! queue.request(tile);
//! queue.request(tile);
//!
//! assert_eq!(queue.drain().collect::<Vec<_>>(), vec![tile]);
//! ```

pub mod draw;
pub mod element;
pub mod events;
pub mod geometry;
pub mod repaint;

pub use draw::{DisplayList, DrawCommand, DrawContext, OpacityScope};
pub use element::{Animatable, ElementId, PropertyValue};
pub use events::{Event, EventData, EventType};
pub use geometry::{Brush, Color, CornerRadius, Gradient, GradientStop, Point, Rect, Size};
pub use repaint::{RepaintQueue, RepaintSink};
