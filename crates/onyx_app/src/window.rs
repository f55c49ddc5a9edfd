//! Top-level window helpers
//!
//! Window translucency is optional platform support. It is resolved once
//! into [`Capabilities`]; when it is missing, opacity requests do nothing
//! and everything else still works.

use onyx_animation::{Result, SchedulerHandle, Timeline, TimelineState, ValueBinding};
use std::rc::Rc;
use std::time::Duration;

/// A top-level window owned by the host
pub trait Window {
    /// Close the window and release its resources
    fn dispose(&self);
}

/// Platform support for translucent windows
pub trait WindowOpacity {
    fn set_opacity(&self, window: &dyn Window, opacity: f32);

    fn set_opaque(&self, window: &dyn Window, opaque: bool);
}

/// Fallback used when the platform has no translucency support
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWindowOpacity;

impl WindowOpacity for NoWindowOpacity {
    fn set_opacity(&self, _window: &dyn Window, _opacity: f32) {}

    fn set_opaque(&self, _window: &dyn Window, _opaque: bool) {}
}

/// Optional platform features, resolved at startup
#[derive(Clone, Default)]
pub struct Capabilities {
    opacity: Option<Rc<dyn WindowOpacity>>,
}

impl Capabilities {
    pub fn new(opacity: Option<Rc<dyn WindowOpacity>>) -> Self {
        match &opacity {
            Some(_) => tracing::debug!("Capabilities: window opacity available"),
            None => tracing::debug!("Capabilities: window opacity unavailable, using no-op"),
        }
        Self { opacity }
    }

    pub fn supports_opacity(&self) -> bool {
        self.opacity.is_some()
    }

    /// The opacity collaborator, or the no-op fallback
    pub fn opacity(&self) -> Rc<dyn WindowOpacity> {
        match &self.opacity {
            Some(opacity) => Rc::clone(opacity),
            None => Rc::new(NoWindowOpacity),
        }
    }
}

/// Fade `window` from opaque to invisible, then dispose it.
///
/// Without opacity support the fade is invisible but the window is still
/// disposed once `duration` has elapsed. The scheduler owns the fade until
/// it ends; the returned handle is only needed to observe or cancel it.
pub fn fade_out_and_dispose(
    scheduler: &SchedulerHandle,
    capabilities: &Capabilities,
    window: Rc<dyn Window>,
    duration: Duration,
) -> Result<Timeline> {
    let opacity = capabilities.opacity();
    let faded = Rc::clone(&window);

    let timeline = Timeline::builder(scheduler)
        .label("window-fade-out")
        .duration(duration)
        .bind(ValueBinding::new(1.0f32, 0.0, move |value| {
            opacity.set_opacity(&*faded, value)
        }))
        .on_state_change(move |_, state| {
            if state == TimelineState::Done {
                window.dispose();
            }
        })
        .build()?;
    scheduler.keep_alive(&timeline)?;
    timeline.play()?;
    Ok(timeline)
}

/// Mark `window` as non-opaque so per-window opacity takes effect
pub fn set_window_non_opaque(capabilities: &Capabilities, window: &dyn Window) {
    capabilities.opacity().set_opaque(window, false);
}
