//! Timelines
//!
//! A [`Timeline`] interpolates its bindings over a fixed duration. It is a
//! cheap clonable handle over render-thread state (`Rc<RefCell<..>>`), so it
//! is `!Send`: only the thread that owns the scheduler can drive it.
//!
//! The interpolation fraction is always `elapsed / duration`. Forward
//! playback walks `elapsed` up to the duration; reverse playback walks it
//! back down to zero, moving every bound value from `to` back to `from`.
//!
//! ```text
//!            play / play_loop / play_reverse
//!   Idle ─────────────────────────────────────▶ Playing ──▶ Done
//!    ▲                                            │  ▲ │
//!    │ reset                              cancel  │  └─┘ loop / direction change
//!    └──────────── Done | Cancelled ◀─────────────┘
//! ```

use crate::binding::Binding;
use crate::easing::Easing;
use crate::error::{AnimationError, Result};
use crate::scenario::ScenarioActor;
use crate::scheduler::{SchedulerHandle, TimelineKey};
use onyx_core::ElementId;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Duration used when a builder doesn't set one
pub const DEFAULT_DURATION: Duration = Duration::from_millis(500);

/// Lifecycle state of a timeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimelineState {
    Idle,
    Playing,
    Done,
    Cancelled,
}

impl TimelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TimelineState::Done | TimelineState::Cancelled)
    }
}

/// What happens when playback reaches a boundary
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RepeatMode {
    /// Stop at the boundary
    #[default]
    None,
    /// Jump back to the starting boundary, same direction
    Loop,
    /// Flip direction (ping-pong)
    LoopReverse,
}

/// Direction `elapsed` is moving in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

type StateListener = Rc<dyn Fn(TimelineState, TimelineState)>;
type CompleteListener = Rc<dyn Fn(TimelineState)>;

pub(crate) struct TimelineInner {
    label: String,
    duration: Duration,
    easing: Easing,
    bindings: Vec<Box<dyn Binding>>,
    pub(crate) state: TimelineState,
    repeat: RepeatMode,
    direction: Direction,
    elapsed: Duration,
    notified: bool,
    pub(crate) registration: Option<TimelineKey>,
    state_listeners: Vec<StateListener>,
    complete_listeners: Vec<CompleteListener>,
    scheduler: SchedulerHandle,
}

impl TimelineInner {
    fn fraction(&self) -> f32 {
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0) as f32
    }

    /// Move `elapsed` by `dt`, folding boundaries according to the repeat
    /// mode. Leftover time after a boundary continues into the next lap.
    /// Returns true when a non-repeating boundary was reached.
    fn advance(&mut self, dt: Duration) -> bool {
        let mut remaining = dt;

        // Whole cycles leave the position unchanged
        let cycle = match self.repeat {
            RepeatMode::None => None,
            RepeatMode::Loop => Some(self.duration),
            RepeatMode::LoopReverse => Some(self.duration * 2),
        };
        if let Some(cycle) = cycle {
            if remaining > cycle {
                let nanos = remaining.as_nanos() % cycle.as_nanos();
                remaining = Duration::from_nanos(nanos as u64);
            }
        }

        loop {
            match self.direction {
                Direction::Forward => {
                    let room = self.duration - self.elapsed;
                    if remaining < room {
                        self.elapsed += remaining;
                        return false;
                    }
                    remaining -= room;
                    self.elapsed = self.duration;
                    match self.repeat {
                        RepeatMode::None => return true,
                        RepeatMode::Loop => {
                            if remaining.is_zero() {
                                return false;
                            }
                            self.elapsed = Duration::ZERO;
                        }
                        RepeatMode::LoopReverse => {
                            self.direction = Direction::Reverse;
                            if remaining.is_zero() {
                                return false;
                            }
                        }
                    }
                }
                Direction::Reverse => {
                    let room = self.elapsed;
                    if remaining < room {
                        self.elapsed -= remaining;
                        return false;
                    }
                    remaining -= room;
                    self.elapsed = Duration::ZERO;
                    match self.repeat {
                        RepeatMode::None => return true,
                        RepeatMode::Loop => {
                            if remaining.is_zero() {
                                return false;
                            }
                            self.elapsed = self.duration;
                        }
                        RepeatMode::LoopReverse => {
                            self.direction = Direction::Forward;
                            if remaining.is_zero() {
                                return false;
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Builder for [`Timeline`]
pub struct TimelineBuilder {
    scheduler: SchedulerHandle,
    label: String,
    duration: Duration,
    easing: Easing,
    bindings: Vec<Box<dyn Binding>>,
    state_listeners: Vec<StateListener>,
    complete_listeners: Vec<CompleteListener>,
}

impl TimelineBuilder {
    /// Name used in logs
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Add a property binding. Bindings are applied in insertion order.
    pub fn bind(mut self, binding: impl Binding + 'static) -> Self {
        self.bindings.push(Box::new(binding));
        self
    }

    /// Called with `(old, new)` on every state transition
    pub fn on_state_change(mut self, listener: impl Fn(TimelineState, TimelineState) + 'static) -> Self {
        self.state_listeners.push(Rc::new(listener));
        self
    }

    /// Called once with the terminal state (`Done` or `Cancelled`)
    pub fn on_complete(mut self, listener: impl Fn(TimelineState) + 'static) -> Self {
        self.complete_listeners.push(Rc::new(listener));
        self
    }

    pub fn build(self) -> Result<Timeline> {
        if self.duration.is_zero() {
            tracing::warn!("Timeline '{}': rejected zero duration", self.label);
            return Err(AnimationError::InvalidDuration);
        }
        Ok(Timeline {
            inner: Rc::new(RefCell::new(TimelineInner {
                label: self.label,
                duration: self.duration,
                easing: self.easing,
                bindings: self.bindings,
                state: TimelineState::Idle,
                repeat: RepeatMode::None,
                direction: Direction::Forward,
                elapsed: Duration::ZERO,
                notified: false,
                registration: None,
                state_listeners: self.state_listeners,
                complete_listeners: self.complete_listeners,
                scheduler: self.scheduler,
            })),
        })
    }
}

/// A time-bounded interpolation of one or more properties
#[derive(Clone)]
pub struct Timeline {
    pub(crate) inner: Rc<RefCell<TimelineInner>>,
}

impl Timeline {
    pub fn builder(scheduler: &SchedulerHandle) -> TimelineBuilder {
        TimelineBuilder {
            scheduler: scheduler.clone(),
            label: String::from("timeline"),
            duration: DEFAULT_DURATION,
            easing: Easing::default(),
            bindings: Vec::new(),
            state_listeners: Vec::new(),
            complete_listeners: Vec::new(),
        }
    }

    pub(crate) fn from_inner(inner: Rc<RefCell<TimelineInner>>) -> Self {
        Self { inner }
    }

    /// Play forward from the start, once.
    ///
    /// While already playing this only switches to forward, non-repeating
    /// playback; the current position is kept.
    pub fn play(&self) -> Result<()> {
        self.start_playback(Direction::Forward, RepeatMode::None)
    }

    /// Play backward from the end, once.
    ///
    /// Allowed from `Done` as the explicit replay of a finished timeline.
    pub fn play_reverse(&self) -> Result<()> {
        self.start_playback(Direction::Reverse, RepeatMode::None)
    }

    /// Play forward, repeating at the boundaries per `mode`
    pub fn play_loop(&self, mode: RepeatMode) -> Result<()> {
        self.start_playback(Direction::Forward, mode)
    }

    fn start_playback(&self, direction: Direction, repeat: RepeatMode) -> Result<()> {
        let from_state = {
            let mut inner = self.inner.borrow_mut();
            let state = inner.state;
            let replay_allowed = state == TimelineState::Done && direction == Direction::Reverse;
            if state.is_terminal() && !replay_allowed {
                tracing::warn!("Timeline '{}': play rejected in {:?}", inner.label, state);
                return Err(AnimationError::PostTerminalMutation(state));
            }

            inner.direction = direction;
            inner.repeat = repeat;
            match state {
                TimelineState::Playing => {}
                _ => {
                    inner.elapsed = match direction {
                        Direction::Forward => Duration::ZERO,
                        Direction::Reverse => inner.duration,
                    };
                    inner.notified = false;
                }
            }
            tracing::trace!(
                "Timeline '{}': play {:?} repeat={:?} from {:?}",
                inner.label,
                direction,
                repeat,
                state
            );
            state
        };

        if from_state != TimelineState::Playing {
            self.ensure_registered()?;
            self.transition(TimelineState::Playing);
        }
        Ok(())
    }

    fn ensure_registered(&self) -> Result<()> {
        if self.is_registered() {
            return Ok(());
        }
        let scheduler = self.inner.borrow().scheduler.clone();
        scheduler.register(self).map(|_| ())
    }

    /// Stop immediately. No further setter runs; terminal state is `Cancelled`.
    pub fn cancel(&self) {
        if self.state().is_terminal() {
            return;
        }
        let scheduler = self.inner.borrow().scheduler.clone();
        scheduler.unregister(self);
        self.transition(TimelineState::Cancelled);
    }

    /// Return to `Idle` at the start, re-arming the completion notification
    pub fn reset(&self) {
        let scheduler = self.inner.borrow().scheduler.clone();
        scheduler.unregister(self);
        {
            let mut inner = self.inner.borrow_mut();
            inner.elapsed = Duration::ZERO;
            inner.direction = Direction::Forward;
            inner.repeat = RepeatMode::None;
            inner.notified = false;
        }
        self.transition(TimelineState::Idle);
    }

    /// Advance by `dt` and write every binding.
    ///
    /// Returns the elements touched this tick (deduplicated).
    pub(crate) fn tick(&self, dt: Duration) -> SmallVec<[ElementId; 4]> {
        let mut touched = SmallVec::new();
        let (shaped, finished, bindings) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != TimelineState::Playing {
                return touched;
            }
            let finished = inner.advance(dt);
            let shaped = inner.easing.apply(inner.fraction());
            (shaped, finished, std::mem::take(&mut inner.bindings))
        };

        for binding in &bindings {
            if let Some(element) = binding.apply(shaped) {
                if !touched.contains(&element) {
                    touched.push(element);
                }
            }
            // A setter may have cancelled or reset us
            if self.state() != TimelineState::Playing {
                break;
            }
        }
        self.inner.borrow_mut().bindings = bindings;

        if finished && self.state() == TimelineState::Playing {
            self.transition(TimelineState::Done);
        }
        touched
    }

    /// Change state and run listeners with no borrow held
    fn transition(&self, new: TimelineState) {
        let (old, state_listeners, complete_listeners) = {
            let mut inner = self.inner.borrow_mut();
            let old = inner.state;
            if old == new {
                return;
            }
            inner.state = new;
            let notify = new.is_terminal() && !inner.notified;
            if notify {
                inner.notified = true;
            }
            tracing::debug!("Timeline '{}': {:?} -> {:?}", inner.label, old, new);
            let complete = if notify {
                inner.complete_listeners.clone()
            } else {
                Vec::new()
            };
            (old, inner.state_listeners.clone(), complete)
        };

        for listener in &state_listeners {
            listener(old, new);
        }
        for listener in &complete_listeners {
            listener(new);
        }
    }

    /// Add a state listener after construction
    pub fn on_state_change(&self, listener: impl Fn(TimelineState, TimelineState) + 'static) {
        self.inner.borrow_mut().state_listeners.push(Rc::new(listener));
    }

    /// Add a completion listener after construction
    pub fn on_complete(&self, listener: impl Fn(TimelineState) + 'static) {
        self.inner
            .borrow_mut()
            .complete_listeners
            .push(Rc::new(listener));
    }

    pub fn state(&self) -> TimelineState {
        self.inner.borrow().state
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.borrow().elapsed
    }

    pub fn duration(&self) -> Duration {
        self.inner.borrow().duration
    }

    pub fn direction(&self) -> Direction {
        self.inner.borrow().direction
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.inner.borrow().repeat
    }

    /// Position in `[0, 1]` (`elapsed / duration`), before easing
    pub fn progress(&self) -> f32 {
        self.inner.borrow().fraction()
    }

    pub fn easing(&self) -> Easing {
        self.inner.borrow().easing
    }

    pub fn label(&self) -> String {
        self.inner.borrow().label.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state() == TimelineState::Playing
    }

    pub fn is_registered(&self) -> bool {
        self.inner.borrow().registration.is_some()
    }

    /// True when every binding's target is still alive
    pub fn targets_live(&self) -> bool {
        self.inner.borrow().bindings.iter().all(|b| b.is_live())
    }

    pub(crate) fn registration(&self) -> Option<TimelineKey> {
        self.inner.borrow().registration
    }

    pub(crate) fn set_registration(&self, key: Option<TimelineKey>) {
        self.inner.borrow_mut().registration = key;
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Timeline) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Timeline")
                .field("label", &inner.label)
                .field("state", &inner.state)
                .field("elapsed", &inner.elapsed)
                .field("duration", &inner.duration)
                .field("direction", &inner.direction)
                .finish(),
            Err(_) => f.write_str("Timeline { <borrowed> }"),
        }
    }
}

impl ScenarioActor for Timeline {
    fn start(&mut self) {
        if let Err(err) = self.play() {
            tracing::warn!("Timeline '{}': scenario start failed: {}", self.label(), err);
        }
    }

    fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    fn cancel(&mut self) {
        Timeline::cancel(self);
    }

    fn label(&self) -> String {
        Timeline::label(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ValueBinding;
    use crate::scheduler::AnimationScheduler;
    use std::cell::Cell;

    const FRAME: Duration = Duration::from_millis(16);

    fn recorded(scheduler: &AnimationScheduler, duration_ms: u64) -> (Timeline, Rc<Cell<f32>>) {
        let value = Rc::new(Cell::new(f32::NAN));
        let sink = value.clone();
        let timeline = Timeline::builder(&scheduler.handle())
            .label("test")
            .duration(Duration::from_millis(duration_ms))
            .bind(ValueBinding::new(0.0f32, 1.0, move |v| sink.set(v)))
            .build()
            .unwrap();
        (timeline, value)
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        let scheduler = AnimationScheduler::new();
        let result = Timeline::builder(&scheduler.handle())
            .duration(Duration::ZERO)
            .build();
        assert_eq!(result.err(), Some(AnimationError::InvalidDuration));
    }

    #[test]
    fn test_play_runs_to_done() {
        let scheduler = AnimationScheduler::new();
        let (timeline, value) = recorded(&scheduler, 100);

        timeline.play().unwrap();
        assert_eq!(timeline.state(), TimelineState::Playing);

        scheduler.tick(Duration::from_millis(50));
        assert!((value.get() - 0.5).abs() < 1e-6);

        scheduler.tick(Duration::from_millis(80));
        assert_eq!(value.get(), 1.0);
        assert_eq!(timeline.state(), TimelineState::Done);
        assert_eq!(timeline.elapsed(), Duration::from_millis(100));
    }

    #[test]
    fn test_reverse_walks_back_to_from() {
        let scheduler = AnimationScheduler::new();
        let (timeline, value) = recorded(&scheduler, 100);

        timeline.play_reverse().unwrap();
        scheduler.tick(Duration::from_millis(25));
        assert!((value.get() - 0.75).abs() < 1e-6);

        scheduler.tick(Duration::from_millis(100));
        assert_eq!(value.get(), 0.0);
        assert_eq!(timeline.state(), TimelineState::Done);
    }

    #[test]
    fn test_loop_wraps_with_carry_over() {
        let scheduler = AnimationScheduler::new();
        let (timeline, value) = recorded(&scheduler, 100);

        timeline.play_loop(RepeatMode::Loop).unwrap();
        scheduler.tick(Duration::from_millis(130));
        assert_eq!(timeline.elapsed(), Duration::from_millis(30));
        assert!((value.get() - 0.3).abs() < 1e-6);
        assert_eq!(timeline.state(), TimelineState::Playing);

        // Many whole cycles in one tick
        scheduler.tick(Duration::from_millis(1020));
        assert_eq!(timeline.elapsed(), Duration::from_millis(50));
    }

    #[test]
    fn test_loop_reverse_round_trip() {
        let scheduler = AnimationScheduler::new();
        let (timeline, value) = recorded(&scheduler, 800);

        timeline.play_loop(RepeatMode::LoopReverse).unwrap();
        for _ in 0..50 {
            scheduler.tick(FRAME);
        }
        assert_eq!(timeline.elapsed(), Duration::from_millis(800));
        assert_eq!(timeline.direction(), Direction::Reverse);
        assert_eq!(value.get(), 1.0);

        for _ in 0..50 {
            scheduler.tick(FRAME);
        }
        assert_eq!(timeline.elapsed(), Duration::ZERO);
        assert_eq!(timeline.direction(), Direction::Forward);
        assert_eq!(value.get(), 0.0);
        assert_eq!(timeline.state(), TimelineState::Playing);
    }

    #[test]
    fn test_direction_change_keeps_position() {
        let scheduler = AnimationScheduler::new();
        let (timeline, _value) = recorded(&scheduler, 100);

        timeline.play_loop(RepeatMode::LoopReverse).unwrap();
        scheduler.tick(Duration::from_millis(40));

        timeline.play_reverse().unwrap();
        assert_eq!(timeline.elapsed(), Duration::from_millis(40));
        assert_eq!(timeline.repeat_mode(), RepeatMode::None);

        scheduler.tick(Duration::from_millis(40));
        assert_eq!(timeline.state(), TimelineState::Done);
        assert_eq!(timeline.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_terminal_replay_rules() {
        let scheduler = AnimationScheduler::new();
        let (timeline, _value) = recorded(&scheduler, 10);

        timeline.play().unwrap();
        scheduler.tick(Duration::from_millis(10));
        assert_eq!(timeline.state(), TimelineState::Done);

        assert_eq!(
            timeline.play(),
            Err(AnimationError::PostTerminalMutation(TimelineState::Done))
        );
        assert_eq!(
            timeline.play_loop(RepeatMode::Loop),
            Err(AnimationError::PostTerminalMutation(TimelineState::Done))
        );
        // Reverse replay of a finished timeline is explicit and allowed
        timeline.play_reverse().unwrap();
        assert_eq!(timeline.elapsed(), Duration::from_millis(10));

        timeline.cancel();
        assert_eq!(
            timeline.play_reverse(),
            Err(AnimationError::PostTerminalMutation(TimelineState::Cancelled))
        );

        timeline.reset();
        assert_eq!(timeline.state(), TimelineState::Idle);
        timeline.play().unwrap();
    }

    #[test]
    fn test_cancel_stops_setters_and_notifies_once() {
        let scheduler = AnimationScheduler::new();
        let writes = Rc::new(Cell::new(0));
        let completions = Rc::new(Cell::new(0));
        let terminal = Rc::new(Cell::new(None));

        let w = writes.clone();
        let c = completions.clone();
        let t = terminal.clone();
        let timeline = Timeline::builder(&scheduler.handle())
            .duration(Duration::from_millis(100))
            .bind(ValueBinding::new(0.0f32, 1.0, move |_| w.set(w.get() + 1)))
            .on_complete(move |state| {
                c.set(c.get() + 1);
                t.set(Some(state));
            })
            .build()
            .unwrap();

        timeline.play().unwrap();
        scheduler.tick(Duration::from_millis(30));
        assert_eq!(writes.get(), 1);

        timeline.cancel();
        timeline.cancel();
        for _ in 0..10 {
            scheduler.tick(FRAME);
        }

        assert_eq!(writes.get(), 1);
        assert_eq!(completions.get(), 1);
        assert_eq!(terminal.get(), Some(TimelineState::Cancelled));
        assert!(!timeline.is_registered());
    }

    #[test]
    fn test_setter_cancelling_its_timeline_stops_later_bindings() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let slot: Rc<RefCell<Option<Timeline>>> = Rc::new(RefCell::new(None));
        let later = Rc::new(Cell::new(0));

        let own = slot.clone();
        let l = later.clone();
        let timeline = Timeline::builder(&handle)
            .duration(Duration::from_millis(100))
            .bind(ValueBinding::new(0.0f32, 1.0, move |_| {
                if let Some(timeline) = own.borrow().as_ref() {
                    timeline.cancel();
                }
            }))
            .bind(ValueBinding::new(0.0f32, 1.0, move |_| l.set(l.get() + 1)))
            .build()
            .unwrap();
        *slot.borrow_mut() = Some(timeline.clone());

        timeline.play().unwrap();
        scheduler.tick(FRAME);

        assert_eq!(timeline.state(), TimelineState::Cancelled);
        assert_eq!(later.get(), 0);
        // Break the self-reference
        slot.borrow_mut().take();
    }

    #[test]
    fn test_state_listener_sees_transitions() {
        let scheduler = AnimationScheduler::new();
        let (timeline, _value) = recorded(&scheduler, 10);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        timeline.on_state_change(move |old, new| log.borrow_mut().push((old, new)));

        timeline.play().unwrap();
        scheduler.tick(Duration::from_millis(20));

        assert_eq!(
            *seen.borrow(),
            vec![
                (TimelineState::Idle, TimelineState::Playing),
                (TimelineState::Playing, TimelineState::Done),
            ]
        );
    }
}
