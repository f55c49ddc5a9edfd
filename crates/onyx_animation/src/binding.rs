//! Property bindings
//!
//! A binding pairs a target property with a `from`/`to` range and writes the
//! interpolated value when its timeline advances. [`PropertyBinding`] drives
//! an [`Animatable`] element through a typed property token and holds the
//! element weakly: once the element is dropped, applying the binding is a
//! no-op. [`ValueBinding`] drives an arbitrary setter closure.

use crate::values::{value_at, Interpolate};
use onyx_core::{Animatable, ElementId, PropertyValue};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A property a timeline writes to
pub trait Binding {
    /// Write the value for eased progress `progress`.
    ///
    /// Returns the element that now needs a repaint, if any.
    fn apply(&self, progress: f32) -> Option<ElementId>;

    /// Whether the target still exists
    fn is_live(&self) -> bool {
        true
    }
}

type Setter<T, V> = Box<dyn Fn(&mut T, <T as Animatable>::Property, V)>;

/// Binding of one typed property on an [`Animatable`] element
pub struct PropertyBinding<T: Animatable, V> {
    target: Weak<RefCell<T>>,
    property: T::Property,
    from: V,
    to: V,
    setter: Setter<T, V>,
}

impl<T, V> PropertyBinding<T, V>
where
    T: Animatable + 'static,
    V: Interpolate + Into<PropertyValue>,
{
    /// Bind `property` of `target`, writing through [`Animatable::set_property`]
    pub fn new(target: &Rc<RefCell<T>>, property: T::Property, from: V, to: V) -> Self {
        Self::from_weak(Rc::downgrade(target), property, from, to)
    }

    /// Same as [`new`](Self::new), for elements that build their own
    /// timelines inside `Rc::new_cyclic`
    pub fn from_weak(target: Weak<RefCell<T>>, property: T::Property, from: V, to: V) -> Self {
        Self {
            target,
            property,
            from,
            to,
            setter: Box::new(|element, property, value| {
                element.set_property(property, value.into())
            }),
        }
    }
}

impl<T, V> PropertyBinding<T, V>
where
    T: Animatable + 'static,
    V: Interpolate,
{
    /// Replace the default setter
    pub fn set_with(mut self, setter: impl Fn(&mut T, V) + 'static) -> Self {
        self.setter = Box::new(move |element, _, value| setter(element, value));
        self
    }

    pub fn property(&self) -> T::Property {
        self.property
    }

    pub fn from(&self) -> &V {
        &self.from
    }

    pub fn to(&self) -> &V {
        &self.to
    }

    /// `from` at 0, `to` at 1, interpolated in between
    pub fn value_at(&self, progress: f32) -> V {
        value_at(&self.from, &self.to, progress)
    }
}

impl<T, V> Binding for PropertyBinding<T, V>
where
    T: Animatable + 'static,
    V: Interpolate,
{
    fn apply(&self, progress: f32) -> Option<ElementId> {
        let target = self.target.upgrade()?;
        let Ok(mut element) = target.try_borrow_mut() else {
            tracing::warn!(
                "PropertyBinding: {:?} skipped, target is borrowed elsewhere",
                self.property
            );
            return None;
        };
        (self.setter)(&mut element, self.property, self.value_at(progress));
        Some(element.element_id())
    }

    fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
}

/// Binding that hands interpolated values to a closure
///
/// Used for targets outside the element tree, such as a window's opacity.
pub struct ValueBinding<V> {
    from: V,
    to: V,
    setter: Box<dyn Fn(V)>,
}

impl<V: Interpolate> ValueBinding<V> {
    pub fn new(from: V, to: V, setter: impl Fn(V) + 'static) -> Self {
        Self {
            from,
            to,
            setter: Box::new(setter),
        }
    }

    pub fn value_at(&self, progress: f32) -> V {
        value_at(&self.from, &self.to, progress)
    }
}

impl<V: Interpolate> Binding for ValueBinding<V> {
    fn apply(&self, progress: f32) -> Option<ElementId> {
        (self.setter)(self.value_at(progress));
        None
    }
}
