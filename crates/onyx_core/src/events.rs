//! Events delivered to tiles
//!
//! The host's visual tree translates platform input into these events and
//! hands them to the element they target.

use crate::element::ElementId;

/// Event type identifier
pub type EventType = u32;

/// Event types a tile reacts to
pub mod event_types {
    use super::EventType;

    pub const POINTER_ENTER: EventType = 4;
    pub const POINTER_LEAVE: EventType = 5;
    pub const RESIZE: EventType = 40;

    // Element lifecycle events
    /// The element became part of a displayed hierarchy
    pub const MOUNT: EventType = 60;
    pub const UNMOUNT: EventType = 61;
}

/// A UI event with associated data
#[derive(Clone, Debug)]
pub struct Event {
    pub event_type: EventType,
    pub target: ElementId,
    pub data: EventData,
    pub timestamp: u64,
}

/// Event-specific data
#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    Pointer { x: f32, y: f32 },
    Resize { width: u32, height: u32 },
    None,
}

impl Event {
    pub fn new(event_type: EventType, target: ElementId) -> Self {
        Self {
            event_type,
            target,
            data: EventData::None,
            timestamp: 0,
        }
    }

    pub fn with_data(mut self, data: EventData) -> Self {
        self.data = data;
        self
    }

    pub fn pointer_enter(target: ElementId, x: f32, y: f32) -> Self {
        Self::new(event_types::POINTER_ENTER, target).with_data(EventData::Pointer { x, y })
    }

    pub fn pointer_leave(target: ElementId, x: f32, y: f32) -> Self {
        Self::new(event_types::POINTER_LEAVE, target).with_data(EventData::Pointer { x, y })
    }

    pub fn resize(target: ElementId, width: u32, height: u32) -> Self {
        Self::new(event_types::RESIZE, target).with_data(EventData::Resize { width, height })
    }

    pub fn mount(target: ElementId) -> Self {
        Self::new(event_types::MOUNT, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_constructors() {
        let id = ElementId::new(3);

        let enter = Event::pointer_enter(id, 4.0, 5.0);
        assert_eq!(enter.event_type, event_types::POINTER_ENTER);
        assert_eq!(enter.data, EventData::Pointer { x: 4.0, y: 5.0 });

        let resize = Event::resize(id, 320, 200);
        assert_eq!(resize.event_type, event_types::RESIZE);
        assert_eq!(
            resize.data,
            EventData::Resize {
                width: 320,
                height: 200
            }
        );

        let mount = Event::mount(id);
        assert_eq!(mount.target, id);
        assert_eq!(mount.data, EventData::None);
    }
}
