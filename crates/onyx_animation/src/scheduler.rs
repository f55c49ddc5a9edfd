//! Animation scheduler
//!
//! The single driver that advances every active timeline on one shared
//! cadence. It lives on the render thread and holds only weak references to
//! timelines and scenarios; whoever created them owns them.
//!
//! Each [`AnimationScheduler::tick`] runs, in order:
//!
//! 1. drain the actor completion channel and run completion handlers
//! 2. poll playing top-level scenarios, in registration order
//! 3. merge timelines registered since the last tick
//! 4. advance active timelines in registration order, dropping the ones
//!    that became terminal or whose handles were dropped
//! 5. poll playing scenarios again, so a member that finished in step 4
//!    completes its parallel or starts the next sequence member this tick
//! 6. flush coalesced repaint requests to the repaint sink
//!
//! Timelines registered during steps 4 and 5 (for example from a completion
//! callback or a sequence advancing) stay pending until the next tick.
//!
//! Timelines handed to [`SchedulerHandle::keep_alive`] are owned by the
//! scheduler until they end, so fire-and-forget animations need no handle.

use crate::dispatch::{Dispatcher, InlineDispatcher, Job};
use crate::error::{AnimationError, Result};
use crate::scenario::{Scenario, ScenarioInner, ScenarioState};
use crate::timeline::{Timeline, TimelineInner, TimelineState};
use onyx_core::{ElementId, RepaintQueue, RepaintSink};
use slotmap::{new_key_type, SlotMap};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

// ============================================================================
// Global Animation Scheduler State
// ============================================================================

thread_local! {
    /// Render-thread scheduler handle
    static GLOBAL_SCHEDULER: RefCell<Option<SchedulerHandle>> = const { RefCell::new(None) };
}

/// Set the render thread's scheduler handle
///
/// Call once at startup, on the render thread, after creating the
/// [`AnimationScheduler`].
///
/// # Panics
///
/// Panics if called more than once on the same thread.
pub fn set_global_scheduler(handle: SchedulerHandle) {
    GLOBAL_SCHEDULER.with(|global| {
        let mut global = global.borrow_mut();
        if global.is_some() {
            panic!("set_global_scheduler() called more than once");
        }
        *global = Some(handle);
    });
}

/// Get the render thread's scheduler handle
///
/// # Panics
///
/// Panics if `set_global_scheduler()` has not been called on this thread.
pub fn get_scheduler() -> SchedulerHandle {
    try_get_scheduler()
        .expect("Animation scheduler not initialized. Call set_global_scheduler() at app startup.")
}

/// Try to get the render thread's scheduler (None if not initialized)
pub fn try_get_scheduler() -> Option<SchedulerHandle> {
    GLOBAL_SCHEDULER.with(|global| global.borrow().clone())
}

/// Check if the render thread's scheduler has been initialized
pub fn is_scheduler_initialized() -> bool {
    GLOBAL_SCHEDULER.with(|global| global.borrow().is_some())
}

new_key_type! {
    /// Registration of an active timeline
    pub struct TimelineKey;
    /// Registration of a playing top-level scenario
    pub struct ScenarioKey;
    /// An actor whose work is in flight
    pub struct ActorKey;
}

/// Result of actor work, type-erased for the completion channel
pub(crate) type Payload = Box<dyn Any + Send>;

type CompletionHandler = Box<dyn FnOnce(Payload)>;

struct SchedulerState {
    timelines: SlotMap<TimelineKey, Weak<RefCell<TimelineInner>>>,
    /// Active timelines, in registration order
    order: Vec<TimelineKey>,
    /// Registered, not yet merged into `order`
    pending: Vec<TimelineKey>,
    scenarios: SlotMap<ScenarioKey, Weak<RefCell<ScenarioInner>>>,
    scenario_order: Vec<ScenarioKey>,
    actors: SlotMap<ActorKey, CompletionHandler>,
    /// Timelines owned by the scheduler until terminal
    kept: Vec<Timeline>,
    repaint: RepaintQueue,
    frames: u64,
}

struct SchedulerShared {
    state: RefCell<SchedulerState>,
    completion_tx: Sender<(ActorKey, Payload)>,
    completion_rx: Receiver<(ActorKey, Payload)>,
    dispatcher: Box<dyn Dispatcher>,
    sink: RefCell<Option<Rc<dyn RepaintSink>>>,
    ticking: Cell<bool>,
}

/// Owner of the render thread's animation state
///
/// Created once on the render thread. Components receive a
/// [`SchedulerHandle`] instead of the scheduler itself.
pub struct AnimationScheduler {
    shared: Rc<SchedulerShared>,
}

impl AnimationScheduler {
    /// Scheduler whose actor work runs inline on the render thread
    pub fn new() -> Self {
        Self::with_dispatcher(InlineDispatcher)
    }

    /// Scheduler whose actor work runs through `dispatcher`
    pub fn with_dispatcher(dispatcher: impl Dispatcher + 'static) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel();
        Self {
            shared: Rc::new(SchedulerShared {
                state: RefCell::new(SchedulerState {
                    timelines: SlotMap::with_key(),
                    order: Vec::new(),
                    pending: Vec::new(),
                    scenarios: SlotMap::with_key(),
                    scenario_order: Vec::new(),
                    actors: SlotMap::with_key(),
                    kept: Vec::new(),
                    repaint: RepaintQueue::new(),
                    frames: 0,
                }),
                completion_tx,
                completion_rx,
                dispatcher: Box::new(dispatcher),
                sink: RefCell::new(None),
                ticking: Cell::new(false),
            }),
        }
    }

    /// Get a weak handle for components and timelines
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.shared),
        }
    }

    /// Where coalesced repaint requests go at the end of each tick
    pub fn set_repaint_sink(&self, sink: impl RepaintSink + 'static) {
        *self.shared.sink.borrow_mut() = Some(Rc::new(sink));
    }

    /// Advance everything by `dt`. Returns true while anything is active.
    pub fn tick(&self, dt: Duration) -> bool {
        if self.shared.ticking.replace(true) {
            tracing::warn!("AnimationScheduler: reentrant tick ignored");
            return self.has_active_animations();
        }

        self.drain_completions();
        self.poll_scenarios();
        self.merge_pending();
        self.advance_timelines(dt);
        self.poll_scenarios();
        self.release_kept();
        self.flush_repaints();

        self.shared.state.borrow_mut().frames += 1;
        self.shared.ticking.set(false);
        self.has_active_animations()
    }

    fn drain_completions(&self) {
        while let Ok((key, payload)) = self.shared.completion_rx.try_recv() {
            let handler = self.shared.state.borrow_mut().actors.remove(key);
            match handler {
                Some(handler) => handler(payload),
                None => tracing::trace!("AnimationScheduler: discarded result of cancelled actor"),
            }
        }
    }

    fn poll_scenarios(&self) {
        let snapshot: Vec<Weak<RefCell<ScenarioInner>>> = {
            let state = self.shared.state.borrow();
            state
                .scenario_order
                .iter()
                .filter_map(|key| state.scenarios.get(*key).cloned())
                .collect()
        };

        for weak in snapshot {
            if let Some(inner) = weak.upgrade() {
                Scenario::from_inner(inner).poll();
            }
        }

        let mut state = self.shared.state.borrow_mut();
        let SchedulerState {
            scenarios,
            scenario_order,
            ..
        } = &mut *state;
        let mut finished = Vec::new();
        scenario_order.retain(|key| {
            let live = scenarios.get(*key).and_then(Weak::upgrade);
            let playing = live
                .as_ref()
                .is_some_and(|inner| Scenario::from_inner(inner.clone()).state() == ScenarioState::Playing);
            if !playing {
                if let Some(inner) = live {
                    Scenario::from_inner(inner).set_registration(None);
                }
                finished.push(*key);
            }
            playing
        });
        for key in finished {
            scenarios.remove(key);
        }
    }

    fn merge_pending(&self) {
        let mut state = self.shared.state.borrow_mut();
        let pending = std::mem::take(&mut state.pending);
        state.order.extend(pending);
    }

    fn advance_timelines(&self, dt: Duration) {
        let snapshot: Vec<Weak<RefCell<TimelineInner>>> = {
            let state = self.shared.state.borrow();
            state
                .order
                .iter()
                .filter_map(|key| state.timelines.get(*key).cloned())
                .collect()
        };

        for weak in snapshot {
            let Some(inner) = weak.upgrade() else {
                continue;
            };
            let touched = Timeline::from_inner(inner).tick(dt);
            if !touched.is_empty() {
                let mut state = self.shared.state.borrow_mut();
                for element in touched {
                    state.repaint.request(element);
                }
            }
        }

        let mut state = self.shared.state.borrow_mut();
        let SchedulerState {
            timelines, order, ..
        } = &mut *state;
        let mut finished = Vec::new();
        order.retain(|key| {
            let live = timelines.get(*key).and_then(Weak::upgrade);
            let playing = live
                .as_ref()
                .is_some_and(|inner| inner.borrow().state == TimelineState::Playing);
            if !playing {
                if let Some(inner) = live {
                    inner.borrow_mut().registration = None;
                }
                finished.push(*key);
            }
            playing
        });
        if !finished.is_empty() {
            tracing::trace!("AnimationScheduler: retired {} timelines", finished.len());
        }
        for key in finished {
            timelines.remove(key);
        }
    }

    fn release_kept(&self) {
        let released: Vec<Timeline> = {
            let mut state = self.shared.state.borrow_mut();
            let (done, kept): (Vec<Timeline>, Vec<Timeline>) = std::mem::take(&mut state.kept)
                .into_iter()
                .partition(|t| t.state().is_terminal());
            state.kept = kept;
            done
        };
        // Dropped with no borrow held; their captures may call back in
        drop(released);
    }

    fn flush_repaints(&self) {
        let mut queue = std::mem::take(&mut self.shared.state.borrow_mut().repaint);
        let sink = self.shared.sink.borrow().clone();
        match sink {
            Some(sink) => {
                queue.flush(sink.as_ref());
            }
            None => {
                queue.drain().for_each(drop);
            }
        }
    }

    /// Timelines advanced on every tick
    pub fn active_count(&self) -> usize {
        self.shared.state.borrow().order.len()
    }

    /// Timelines registered but not yet ticked
    pub fn pending_count(&self) -> usize {
        self.shared.state.borrow().pending.len()
    }

    /// Active plus pending timelines
    pub fn timeline_count(&self) -> usize {
        let state = self.shared.state.borrow();
        state.order.len() + state.pending.len()
    }

    /// Playing top-level scenarios
    pub fn scenario_count(&self) -> usize {
        self.shared.state.borrow().scenario_order.len()
    }

    /// Actors whose work has been dispatched but not yet delivered
    pub fn in_flight_actors(&self) -> usize {
        self.shared.state.borrow().actors.len()
    }

    /// Timelines owned through [`SchedulerHandle::keep_alive`]
    pub fn kept_count(&self) -> usize {
        self.shared.state.borrow().kept.len()
    }

    /// Ticks run so far
    pub fn frame_count(&self) -> u64 {
        self.shared.state.borrow().frames
    }

    pub fn has_active_animations(&self) -> bool {
        let state = self.shared.state.borrow();
        !state.order.is_empty()
            || !state.pending.is_empty()
            || !state.scenario_order.is_empty()
            || !state.actors.is_empty()
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Weak handle to the render thread's scheduler
///
/// Every operation fails with [`AnimationError::SchedulerGone`] (or is a
/// no-op) once the scheduler has been dropped.
#[derive(Clone, Default)]
pub struct SchedulerHandle {
    inner: Weak<SchedulerShared>,
}

impl SchedulerHandle {
    fn shared(&self) -> Result<Rc<SchedulerShared>> {
        self.inner.upgrade().ok_or(AnimationError::SchedulerGone)
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Register a timeline. It is first ticked on the next tick.
    pub fn register(&self, timeline: &Timeline) -> Result<TimelineKey> {
        let shared = self.shared()?;
        let mut state = shared.state.borrow_mut();
        if let Some(key) = timeline.registration() {
            if state.timelines.contains_key(key) {
                tracing::warn!("Timeline '{}': double registration rejected", timeline.label());
                return Err(AnimationError::DoubleRegistration);
            }
        }
        let key = state.timelines.insert(Rc::downgrade(&timeline.inner));
        state.pending.push(key);
        timeline.set_registration(Some(key));
        Ok(key)
    }

    /// Remove a timeline's registration. Returns false if it had none.
    pub fn unregister(&self, timeline: &Timeline) -> bool {
        let Some(key) = timeline.registration() else {
            return false;
        };
        timeline.set_registration(None);
        let Ok(shared) = self.shared() else {
            return false;
        };
        let mut state = shared.state.borrow_mut();
        state.order.retain(|k| *k != key);
        state.pending.retain(|k| *k != key);
        state.timelines.remove(key).is_some()
    }

    /// Hold a strong reference to `timeline` until it is `Done` or
    /// `Cancelled`, so it keeps running after the caller drops its handle
    pub fn keep_alive(&self, timeline: &Timeline) -> Result<()> {
        let shared = self.shared()?;
        let mut state = shared.state.borrow_mut();
        if !state.kept.iter().any(|t| t.ptr_eq(timeline)) {
            state.kept.push(timeline.clone());
        }
        Ok(())
    }

    pub(crate) fn register_scenario(&self, scenario: &Scenario) -> Result<ScenarioKey> {
        let shared = self.shared()?;
        let mut state = shared.state.borrow_mut();
        let key = state.scenarios.insert(Rc::downgrade(&scenario.inner));
        state.scenario_order.push(key);
        Ok(key)
    }

    pub(crate) fn unregister_scenario(&self, key: ScenarioKey) {
        if let Ok(shared) = self.shared() {
            let mut state = shared.state.borrow_mut();
            state.scenario_order.retain(|k| *k != key);
            state.scenarios.remove(key);
        }
    }

    /// Queue a repaint for `element`, coalesced with this tick's requests
    pub fn request_repaint(&self, element: ElementId) {
        if let Ok(shared) = self.shared() {
            shared.state.borrow_mut().repaint.request(element);
        }
    }

    /// Dispatch `work` off the render thread.
    ///
    /// `on_result` runs on the render thread during a later tick with the
    /// work's payload, unless [`discard`](Self::discard) is called first.
    pub(crate) fn submit(
        &self,
        on_result: CompletionHandler,
        work: Box<dyn FnOnce() -> Payload + Send>,
    ) -> Result<ActorKey> {
        let shared = self.shared()?;
        let key = shared.state.borrow_mut().actors.insert(on_result);
        let tx = shared.completion_tx.clone();
        let job: Job = Box::new(move || {
            let payload = work();
            // Receiver gone means the scheduler was dropped
            let _ = tx.send((key, payload));
        });
        shared.dispatcher.dispatch(job);
        Ok(key)
    }

    /// Forget an in-flight actor; its result will be dropped on arrival
    pub(crate) fn discard(&self, key: ActorKey) -> bool {
        match self.shared() {
            Ok(shared) => shared.state.borrow_mut().actors.remove(key).is_some(),
            Err(_) => false,
        }
    }
}

/// Fixed-interval frame cadence
///
/// All timelines share this one source so their relative timing stays
/// consistent.
#[derive(Debug)]
pub struct FrameClock {
    interval: Duration,
    last: Instant,
    deadline: Instant,
}

impl FrameClock {
    pub fn new(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            interval,
            last: now,
            deadline: now + interval,
        }
    }

    pub fn from_fps(fps: u32) -> Self {
        Self::new(Duration::from_secs(1) / fps.max(1))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep until the next frame deadline and return the time since the
    /// previous frame
    pub fn next_frame(&mut self) -> Duration {
        let now = Instant::now();
        if self.deadline > now {
            thread::sleep(self.deadline - now);
        }
        let now = Instant::now();
        let dt = now - self.last;
        self.last = now;
        self.deadline += self.interval;
        // Fell behind: don't try to catch up with a burst of frames
        if self.deadline < now {
            self.deadline = now + self.interval;
        }
        dt
    }

    /// Tick `scheduler` once per frame until nothing is active.
    /// Returns the number of frames run.
    pub fn run_until_idle(&mut self, scheduler: &AnimationScheduler) -> u64 {
        let mut frames = 0;
        loop {
            let dt = self.next_frame();
            frames += 1;
            if !scheduler.tick(dt) {
                return frames;
            }
        }
    }
}
