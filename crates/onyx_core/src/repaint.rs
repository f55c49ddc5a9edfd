//! Repaint coalescing
//!
//! Several timelines may write properties of the same element during one
//! frame. Each write records the element here; the frame driver flushes the
//! queue once, so the visual tree sees at most one repaint request per
//! element per frame, in first-touched order.

use crate::element::ElementId;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

/// Receives coalesced repaint requests (implemented by the visual tree)
pub trait RepaintSink {
    fn request_repaint(&self, element: ElementId);
}

impl<F> RepaintSink for F
where
    F: Fn(ElementId),
{
    fn request_repaint(&self, element: ElementId) {
        self(element)
    }
}

/// Ordered, de-duplicated set of elements awaiting a repaint
#[derive(Debug, Default)]
pub struct RepaintQueue {
    order: SmallVec<[ElementId; 8]>,
    seen: FxHashSet<ElementId>,
}

impl RepaintQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `element` changed. Returns false if it was already queued.
    pub fn request(&mut self, element: ElementId) -> bool {
        if self.seen.insert(element) {
            self.order.push(element);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.seen.contains(&element)
    }

    /// Take every queued element, leaving the queue empty
    pub fn drain(&mut self) -> impl Iterator<Item = ElementId> {
        self.seen.clear();
        std::mem::take(&mut self.order).into_iter()
    }

    /// Drain into a sink. Returns the number of requests delivered.
    pub fn flush(&mut self, sink: &dyn RepaintSink) -> usize {
        let mut delivered = 0;
        for element in self.drain() {
            sink.request_repaint(element);
            delivered += 1;
        }
        if delivered > 0 {
            tracing::trace!("RepaintQueue: flushed {} repaint requests", delivered);
        }
        delivered
    }
}
