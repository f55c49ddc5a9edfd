//! Animatable element interface
//!
//! A visual element exposes a fixed set of interpolatable properties, each
//! named by a typed token (usually a small `enum`) rather than a string.
//! Timelines resolve the token once, when a binding is built, and write
//! values back through [`Animatable::set_property`].

use crate::geometry::Color;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a paintable element, used to coalesce repaint requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl ElementId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocate a process-unique id
    pub fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// A value that can be written to an animatable property
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PropertyValue {
    Float(f32),
    Color(Color),
}

impl PropertyValue {
    /// The float payload, if this is a float property
    pub fn as_float(&self) -> Option<f32> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Color(_) => None,
        }
    }

    /// The color payload, if this is a color property
    pub fn as_color(&self) -> Option<Color> {
        match self {
            PropertyValue::Color(c) => Some(*c),
            PropertyValue::Float(_) => None,
        }
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<Color> for PropertyValue {
    fn from(value: Color) -> Self {
        PropertyValue::Color(value)
    }
}

/// An element whose named float/color properties can be driven by timelines
///
/// Implementations must only touch the addressed property in
/// `set_property`; the caller takes care of requesting a repaint for
/// [`element_id`](Animatable::element_id).
pub trait Animatable {
    /// Token naming one interpolatable property of this element
    type Property: Copy + fmt::Debug;

    /// Identity used for repaint coalescing
    fn element_id(&self) -> ElementId;

    /// Write a property. Values of the wrong kind are ignored.
    fn set_property(&mut self, property: Self::Property, value: PropertyValue);

    /// Read a property's current value
    fn property(&self, property: Self::Property) -> PropertyValue;
}
