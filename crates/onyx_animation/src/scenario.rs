//! Scenarios
//!
//! A [`Scenario`] composes timelines, async actors, synchronous steps and
//! other scenarios into one playable unit:
//!
//! - **Sequence**: member *i+1* starts only once member *i* is terminal.
//!   Members that finish as soon as they start (such as a [`Step`]) chain
//!   within the same poll.
//! - **Parallel**: every member starts together; the scenario is terminal
//!   once all of them are (a barrier, not a race).
//!
//! A failed actor is terminal. Under [`FailurePolicy::Continue`] (the
//! default) a sequence treats it like a completed one and moves on; stages
//! downstream decide for themselves whether there is anything left to do.
//! Under [`FailurePolicy::Abort`] the sequence cancels its remaining
//! members and ends `Cancelled`.

use crate::error::Result;
use crate::scheduler::{ScenarioKey, SchedulerHandle};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A member of a scenario
pub trait ScenarioActor {
    /// Begin work. Called at most once by the owning scenario.
    fn start(&mut self);

    /// Give the member a chance to make progress. Called once per tick
    /// while the member is active.
    fn poll(&mut self) {}

    fn is_terminal(&self) -> bool;

    /// Whether the member ended in failure
    fn has_failed(&self) -> bool {
        false
    }

    fn cancel(&mut self);

    /// Name used in logs
    fn label(&self) -> String;
}

/// How members are activated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioKind {
    Sequence,
    Parallel,
}

/// Reaction of a sequence to a failed member
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Treat failure as terminal and advance
    #[default]
    Continue,
    /// Cancel the remaining members
    Abort,
}

/// Lifecycle state of a scenario
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioState {
    Idle,
    Playing,
    Done,
    Cancelled,
}

impl ScenarioState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ScenarioState::Done | ScenarioState::Cancelled)
    }
}

type CompleteListener = Rc<dyn Fn(ScenarioState)>;

pub(crate) struct ScenarioInner {
    label: String,
    kind: ScenarioKind,
    policy: FailurePolicy,
    members: Vec<Box<dyn ScenarioActor>>,
    /// Index of the active member (Sequence)
    current: usize,
    state: ScenarioState,
    notified: bool,
    registration: Option<ScenarioKey>,
    listeners: Vec<CompleteListener>,
    scheduler: SchedulerHandle,
}

enum PollOutcome {
    Running,
    Done,
    Aborted,
}

/// A composed, ordered or parallel group of actors
#[derive(Clone)]
pub struct Scenario {
    pub(crate) inner: Rc<RefCell<ScenarioInner>>,
}

impl Scenario {
    fn new(scheduler: &SchedulerHandle, kind: ScenarioKind) -> Self {
        let label = match kind {
            ScenarioKind::Sequence => "sequence",
            ScenarioKind::Parallel => "parallel",
        };
        Self {
            inner: Rc::new(RefCell::new(ScenarioInner {
                label: label.to_string(),
                kind,
                policy: FailurePolicy::default(),
                members: Vec::new(),
                current: 0,
                state: ScenarioState::Idle,
                notified: false,
                registration: None,
                listeners: Vec::new(),
                scheduler: scheduler.clone(),
            })),
        }
    }

    pub fn sequence(scheduler: &SchedulerHandle) -> Self {
        Self::new(scheduler, ScenarioKind::Sequence)
    }

    pub fn parallel(scheduler: &SchedulerHandle) -> Self {
        Self::new(scheduler, ScenarioKind::Parallel)
    }

    pub(crate) fn from_inner(inner: Rc<RefCell<ScenarioInner>>) -> Self {
        Self { inner }
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        self.inner.borrow_mut().label = label.into();
        self
    }

    pub fn with_policy(self, policy: FailurePolicy) -> Self {
        self.inner.borrow_mut().policy = policy;
        self
    }

    /// Append a member (alias of [`with`](Self::with), reads better for sequences)
    pub fn then(self, member: impl ScenarioActor + 'static) -> Self {
        self.inner.borrow_mut().members.push(Box::new(member));
        self
    }

    /// Append a member
    pub fn with(self, member: impl ScenarioActor + 'static) -> Self {
        self.then(member)
    }

    /// Called once with the terminal state
    pub fn on_complete(self, listener: impl Fn(ScenarioState) + 'static) -> Self {
        self.inner.borrow_mut().listeners.push(Rc::new(listener));
        self
    }

    pub fn kind(&self) -> ScenarioKind {
        self.inner.borrow().kind
    }

    pub fn policy(&self) -> FailurePolicy {
        self.inner.borrow().policy
    }

    pub fn state(&self) -> ScenarioState {
        self.inner.borrow().state
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start the scenario and hand it to the scheduler for polling.
    ///
    /// No-op unless `Idle`. Use this for top-level scenarios; nested ones
    /// are started and polled by their parent.
    pub fn play(&self) -> Result<()> {
        if self.state() != ScenarioState::Idle {
            return Ok(());
        }
        let scheduler = self.inner.borrow().scheduler.clone();
        let key = scheduler.register_scenario(self)?;
        self.set_registration(Some(key));
        self.activate();
        Ok(())
    }

    /// Cancel the active member(s) and prevent any further activation
    pub fn cancel(&self) {
        let (members, registration, scheduler) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_terminal() {
                return;
            }
            inner.state = ScenarioState::Cancelled;
            (
                std::mem::take(&mut inner.members),
                inner.registration.take(),
                inner.scheduler.clone(),
            )
        };
        if let Some(key) = registration {
            scheduler.unregister_scenario(key);
        }

        let mut members = members;
        for member in members.iter_mut().filter(|m| !m.is_terminal()) {
            member.cancel();
        }
        self.restore_members(members);
        self.notify(ScenarioState::Cancelled);
    }

    fn activate(&self) {
        let (kind, mut members, label) = {
            let mut inner = self.inner.borrow_mut();
            inner.state = ScenarioState::Playing;
            inner.current = 0;
            inner.notified = false;
            (
                inner.kind,
                std::mem::take(&mut inner.members),
                inner.label.clone(),
            )
        };
        tracing::debug!("Scenario '{}': started with {} members", label, members.len());

        match kind {
            ScenarioKind::Sequence => {
                if let Some(first) = members.first_mut() {
                    first.start();
                }
            }
            ScenarioKind::Parallel => {
                for member in members.iter_mut() {
                    member.start();
                }
            }
        }
        self.restore_members(members);
    }

    /// Advance member activation. Called by the scheduler (top level) or
    /// by the parent scenario (nested).
    pub(crate) fn poll(&self) {
        let (kind, policy, mut members, mut current, label) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != ScenarioState::Playing {
                return;
            }
            (
                inner.kind,
                inner.policy,
                std::mem::take(&mut inner.members),
                inner.current,
                inner.label.clone(),
            )
        };

        let outcome = match kind {
            ScenarioKind::Sequence => loop {
                let Some(member) = members.get_mut(current) else {
                    break PollOutcome::Done;
                };
                member.poll();
                if !member.is_terminal() {
                    break PollOutcome::Running;
                }
                if member.has_failed() {
                    tracing::warn!(
                        "Scenario '{}': member '{}' failed ({:?})",
                        label,
                        member.label(),
                        policy
                    );
                    if policy == FailurePolicy::Abort {
                        break PollOutcome::Aborted;
                    }
                }
                current += 1;
                if let Some(next) = members.get_mut(current) {
                    tracing::trace!("Scenario '{}': starting '{}'", label, next.label());
                    next.start();
                }
            },
            ScenarioKind::Parallel => {
                for member in members.iter_mut() {
                    member.poll();
                }
                if members.iter().all(|m| m.is_terminal()) {
                    PollOutcome::Done
                } else {
                    PollOutcome::Running
                }
            }
        };

        // Cancelled by a member while we were polling
        let cancelled_meanwhile = {
            let mut inner = self.inner.borrow_mut();
            inner.current = current;
            inner.state == ScenarioState::Cancelled
        };
        if cancelled_meanwhile {
            for member in members.iter_mut().filter(|m| !m.is_terminal()) {
                member.cancel();
            }
            self.restore_members(members);
            return;
        }

        match outcome {
            PollOutcome::Running => self.restore_members(members),
            PollOutcome::Done => {
                self.restore_members(members);
                self.finish(ScenarioState::Done);
            }
            PollOutcome::Aborted => {
                for member in members.iter_mut().skip(current + 1) {
                    member.cancel();
                }
                self.restore_members(members);
                self.finish(ScenarioState::Cancelled);
            }
        }
    }

    fn restore_members(&self, mut members: Vec<Box<dyn ScenarioActor>>) {
        let mut inner = self.inner.borrow_mut();
        // Keep anything appended while the members were out
        members.append(&mut inner.members);
        inner.members = members;
    }

    fn finish(&self, state: ScenarioState) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.state = state;
        }
        self.notify(state);
    }

    fn notify(&self, state: ScenarioState) {
        let (listeners, label) = {
            let mut inner = self.inner.borrow_mut();
            if inner.notified {
                return;
            }
            inner.notified = true;
            (inner.listeners.clone(), inner.label.clone())
        };
        tracing::debug!("Scenario '{}': {:?}", label, state);
        for listener in &listeners {
            listener(state);
        }
    }

    pub(crate) fn set_registration(&self, key: Option<ScenarioKey>) {
        self.inner.borrow_mut().registration = key;
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Scenario")
                .field("label", &inner.label)
                .field("kind", &inner.kind)
                .field("state", &inner.state)
                .field("members", &inner.members.len())
                .finish(),
            Err(_) => f.write_str("Scenario { <borrowed> }"),
        }
    }
}

impl ScenarioActor for Scenario {
    fn start(&mut self) {
        if self.state() == ScenarioState::Idle {
            self.activate();
        }
    }

    fn poll(&mut self) {
        Scenario::poll(self);
    }

    fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    fn cancel(&mut self) {
        Scenario::cancel(self);
    }

    fn label(&self) -> String {
        self.inner.borrow().label.clone()
    }
}

/// Synchronous render-thread action
///
/// Runs its closure when started and is terminal immediately afterwards.
pub struct Step {
    label: String,
    action: Option<Box<dyn FnOnce()>>,
    finished: bool,
}

impl Step {
    pub fn new(label: impl Into<String>, action: impl FnOnce() + 'static) -> Self {
        Self {
            label: label.into(),
            action: Some(Box::new(action)),
            finished: false,
        }
    }
}

impl ScenarioActor for Step {
    fn start(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
        self.finished = true;
    }

    fn is_terminal(&self) -> bool {
        self.finished
    }

    fn cancel(&mut self) {
        self.action = None;
        self.finished = true;
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::AnimationScheduler;
    use crate::timeline::{Timeline, TimelineState};
    use std::cell::Cell;
    use std::time::Duration;

    fn log_step(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Step {
        let log = log.clone();
        Step::new(name, move || log.borrow_mut().push(name))
    }

    #[test]
    fn test_steps_chain_within_one_poll() {
        let scheduler = AnimationScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let scenario = Scenario::sequence(&scheduler.handle())
            .then(log_step(&log, "a"))
            .then(log_step(&log, "b"))
            .then(log_step(&log, "c"));

        scenario.play().unwrap();
        // First member starts on play
        assert_eq!(*log.borrow(), vec!["a"]);

        scheduler.tick(Duration::from_millis(16));
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(scenario.state(), ScenarioState::Done);
        assert_eq!(scheduler.scenario_count(), 0);
    }

    #[test]
    fn test_sequence_waits_for_timeline() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let log = Rc::new(RefCell::new(Vec::new()));
        let fade = Timeline::builder(&handle)
            .duration(Duration::from_millis(32))
            .build()
            .unwrap();

        let scenario = Scenario::sequence(&handle)
            .then(fade.clone())
            .then(log_step(&log, "after"));
        scenario.play().unwrap();

        scheduler.tick(Duration::from_millis(16));
        assert!(log.borrow().is_empty());
        scheduler.tick(Duration::from_millis(16));
        // The next member starts on the tick the fade finishes
        assert_eq!(fade.state(), TimelineState::Done);
        assert_eq!(*log.borrow(), vec!["after"]);
        assert_eq!(scenario.state(), ScenarioState::Done);
    }

    #[test]
    fn test_parallel_ends_on_the_tick_its_last_member_ends() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let short = Timeline::builder(&handle)
            .duration(Duration::from_millis(16))
            .build()
            .unwrap();
        let long = Timeline::builder(&handle)
            .duration(Duration::from_millis(32))
            .build()
            .unwrap();
        let scenario = Scenario::parallel(&handle)
            .with(short.clone())
            .with(long.clone());
        scenario.play().unwrap();

        scheduler.tick(Duration::from_millis(16));
        assert_eq!(short.state(), TimelineState::Done);
        assert_eq!(scenario.state(), ScenarioState::Playing);

        scheduler.tick(Duration::from_millis(16));
        assert_eq!(long.state(), TimelineState::Done);
        assert_eq!(scenario.state(), ScenarioState::Done);
        assert_eq!(scheduler.scenario_count(), 0);
    }

    #[test]
    fn test_empty_scenarios_complete() {
        let scheduler = AnimationScheduler::new();
        let done = Rc::new(Cell::new(0));
        let d = done.clone();
        let scenario = Scenario::parallel(&scheduler.handle()).on_complete(move |_| d.set(d.get() + 1));

        assert!(scenario.is_empty());
        scenario.play().unwrap();
        scheduler.tick(Duration::from_millis(16));
        scheduler.tick(Duration::from_millis(16));
        assert_eq!(scenario.state(), ScenarioState::Done);
        assert_eq!(done.get(), 1);
    }

    #[test]
    fn test_cancel_skips_remaining_members() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let log = Rc::new(RefCell::new(Vec::new()));
        let slow = Timeline::builder(&handle)
            .duration(Duration::from_secs(1))
            .build()
            .unwrap();
        let scenario = Scenario::sequence(&handle)
            .then(slow.clone())
            .then(log_step(&log, "never"));

        scenario.play().unwrap();
        scheduler.tick(Duration::from_millis(16));
        scenario.cancel();
        scheduler.tick(Duration::from_secs(2));

        assert_eq!(scenario.state(), ScenarioState::Cancelled);
        assert_eq!(slow.state(), TimelineState::Cancelled);
        assert!(log.borrow().is_empty());
        assert_eq!(scenario.len(), 2);
    }

    #[test]
    fn test_play_twice_is_noop() {
        let scheduler = AnimationScheduler::new();
        let scenario = Scenario::sequence(&scheduler.handle()).then(Step::new("s", || {}));
        scenario.play().unwrap();
        scenario.play().unwrap();
        assert_eq!(scheduler.scenario_count(), 1);
    }
}
