//! Onyx Animation Engine
//!
//! Time-based property animation and staged pipelines for Onyx tiles.
//!
//! # Features
//!
//! - **Easing**: linear, polynomial, cubic-bezier and tension splines
//! - **Timelines**: interpolate typed element properties once, looping, or ping-pong
//! - **Scenarios**: sequence or fan out timelines, steps and async actors
//! - **Async Actors**: blocking work off the render thread, results delivered back on it
//! - **Scheduler**: one render-thread cadence for every active timeline, with
//!   coalesced repaint requests
//!
//! # Example
//!
//! ```rust
//! use onyx_animation::{AnimationScheduler, Easing, Timeline, ValueBinding};
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! let scheduler = AnimationScheduler::new();
//! let opacity = Rc::new(Cell::new(0.0f32));
//! let sink = opacity.clone();
//!
//! let fade = Timeline::builder(&scheduler.handle())
//!     .duration(Duration::from_millis(500))
//!     .easing(Easing::EaseOut)
//!     .bind(ValueBinding::new(0.0f32, 1.0, move |v| sink.set(v)))
//!     .build()
//!     .unwrap();
//!
//! fade.play().unwrap();
//! while scheduler.tick(Duration::from_millis(16)) {}
//! assert_eq!(opacity.get(), 1.0);
//! ```

pub mod actor;
pub mod binding;
pub mod dispatch;
pub mod easing;
pub mod error;
pub mod scenario;
pub mod scheduler;
pub mod timeline;
pub mod values;

pub use actor::{ActorState, AsyncActor};
pub use binding::{Binding, PropertyBinding, ValueBinding};
pub use dispatch::{Dispatcher, InlineDispatcher, Job, WorkerPool};
pub use easing::Easing;
pub use error::{AnimationError, Result};
pub use scenario::{FailurePolicy, Scenario, ScenarioActor, ScenarioKind, ScenarioState, Step};
pub use scheduler::{
    get_scheduler, is_scheduler_initialized, set_global_scheduler, try_get_scheduler,
    ActorKey, AnimationScheduler, FrameClock, ScenarioKey, SchedulerHandle, TimelineKey,
};
pub use timeline::{Direction, RepeatMode, Timeline, TimelineBuilder, TimelineState};
pub use values::Interpolate;
