//! Async actors
//!
//! An [`AsyncActor`] is a scenario member whose work body runs off the
//! render thread through the scheduler's dispatcher. The result travels
//! back over the scheduler's completion channel and is delivered on the
//! render thread during the next tick, before any scenario is polled, so
//! no timeline or setter ever runs concurrently with the work itself.
//!
//! Cancelling before dispatch prevents the work from running. Cancelling
//! while it runs lets it finish but drops the result unseen.

use crate::error::{AnimationError, Result};
use crate::scenario::ScenarioActor;
use crate::scheduler::{ActorKey, Payload, SchedulerHandle};
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

/// Lifecycle state of an actor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorState {
    /// Not yet started
    Pending,
    /// Work dispatched, result not yet delivered
    Running,
    Completed,
    /// Deferred preparation found nothing to do
    Skipped,
    Failed,
    Cancelled,
}

impl ActorState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ActorState::Pending | ActorState::Running)
    }
}

type BoxedWork<T> = Box<dyn FnOnce() -> Result<T> + Send>;

enum Work<T> {
    Ready(BoxedWork<T>),
    Deferred(Box<dyn FnOnce() -> Option<BoxedWork<T>>>),
}

type CompletionCallback<T> = Box<dyn FnOnce(Result<T>)>;

struct ActorInner<T> {
    label: String,
    state: ActorState,
    work: Option<Work<T>>,
    key: Option<ActorKey>,
    error: Option<AnimationError>,
    on_complete: Option<CompletionCallback<T>>,
    scheduler: SchedulerHandle,
}

/// A unit of blocking work participating in a scenario
pub struct AsyncActor<T: Send + 'static> {
    inner: Rc<RefCell<ActorInner<T>>>,
}

impl<T: Send + 'static> Clone for AsyncActor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

fn box_work<T, E, F>(work: F) -> BoxedWork<T>
where
    F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
    E: fmt::Display,
{
    Box::new(move || work().map_err(|e| AnimationError::FetchFailure(e.to_string())))
}

impl<T: Send + 'static> AsyncActor<T> {
    /// Actor for work that is ready now. Errors become
    /// [`AnimationError::FetchFailure`].
    pub fn new<F, E>(scheduler: &SchedulerHandle, work: F) -> Self
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        E: fmt::Display,
    {
        Self::with_work(scheduler, Work::Ready(box_work(work)))
    }

    /// Actor whose work is built on the render thread when it starts.
    ///
    /// `prepare` typically reads what an earlier stage produced. Returning
    /// `None` means there is nothing to do: the actor ends `Skipped`
    /// without dispatching anything.
    pub fn deferred<P, F, E>(scheduler: &SchedulerHandle, prepare: P) -> Self
    where
        P: FnOnce() -> Option<F> + 'static,
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        E: fmt::Display,
    {
        let prepare = Box::new(move || prepare().map(box_work));
        Self::with_work(scheduler, Work::Deferred(prepare))
    }

    fn with_work(scheduler: &SchedulerHandle, work: Work<T>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ActorInner {
                label: String::from("actor"),
                state: ActorState::Pending,
                work: Some(work),
                key: None,
                error: None,
                on_complete: None,
                scheduler: scheduler.clone(),
            })),
        }
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        self.inner.borrow_mut().label = label.into();
        self
    }

    /// Called on the render thread with the work's result.
    ///
    /// Not called for `Skipped` or `Cancelled` actors.
    pub fn on_complete(self, callback: impl FnOnce(Result<T>) + 'static) -> Self {
        self.inner.borrow_mut().on_complete = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> ActorState {
        self.inner.borrow().state
    }

    /// The failure, once `Failed`
    pub fn error(&self) -> Option<AnimationError> {
        self.inner.borrow().error.clone()
    }

    /// Dispatch the work. No-op unless `Pending`.
    pub fn submit(&self) -> Result<()> {
        let (work, scheduler, label) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != ActorState::Pending {
                return Ok(());
            }
            (inner.work.take(), inner.scheduler.clone(), inner.label.clone())
        };

        // Preparation runs with no borrow held
        let work = match work {
            Some(Work::Ready(work)) => Some(work),
            Some(Work::Deferred(prepare)) => prepare(),
            None => None,
        };

        let Some(work) = work else {
            let mut inner = self.inner.borrow_mut();
            if inner.state == ActorState::Pending {
                tracing::debug!("AsyncActor '{}': nothing to do, skipped", label);
                inner.state = ActorState::Skipped;
            }
            return Ok(());
        };

        if self.state() != ActorState::Pending {
            // Cancelled during preparation
            return Ok(());
        }

        let job = Box::new(move || -> Payload {
            let result = match panic::catch_unwind(AssertUnwindSafe(work)) {
                Ok(result) => result,
                Err(_) => Err(AnimationError::FetchFailure(String::from(
                    "actor work panicked",
                ))),
            };
            Box::new(result)
        });

        match scheduler.submit(Self::completion_handler(Rc::downgrade(&self.inner)), job) {
            Ok(key) => {
                let mut inner = self.inner.borrow_mut();
                inner.state = ActorState::Running;
                inner.key = Some(key);
                tracing::trace!("AsyncActor '{}': dispatched", label);
                Ok(())
            }
            Err(err) => {
                let callback = {
                    let mut inner = self.inner.borrow_mut();
                    inner.state = ActorState::Failed;
                    inner.error = Some(err.clone());
                    inner.on_complete.take()
                };
                tracing::warn!("AsyncActor '{}': dispatch failed: {}", label, err);
                if let Some(callback) = callback {
                    callback(Err(err.clone()));
                }
                Err(err)
            }
        }
    }

    fn completion_handler(weak: Weak<RefCell<ActorInner<T>>>) -> Box<dyn FnOnce(Payload)> {
        Box::new(move |payload: Payload| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let result = match payload.downcast::<Result<T>>() {
                Ok(result) => *result,
                Err(_) => Err(AnimationError::FetchFailure(String::from(
                    "unexpected actor payload",
                ))),
            };

            let callback = {
                let mut inner = inner.borrow_mut();
                if inner.state != ActorState::Running {
                    return;
                }
                inner.key = None;
                match &result {
                    Ok(_) => {
                        inner.state = ActorState::Completed;
                        tracing::trace!("AsyncActor '{}': completed", inner.label);
                    }
                    Err(err) => {
                        tracing::warn!("AsyncActor '{}': {}", inner.label, err);
                        inner.state = ActorState::Failed;
                        inner.error = Some(err.clone());
                    }
                }
                inner.on_complete.take()
            };

            if let Some(callback) = callback {
                callback(result);
            }
        })
    }

    /// Cancel. Pending work never runs; running work's result is dropped.
    pub fn cancel(&self) {
        let (key, scheduler) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_terminal() {
                return;
            }
            inner.state = ActorState::Cancelled;
            inner.work = None;
            inner.on_complete = None;
            (inner.key.take(), inner.scheduler.clone())
        };
        if let Some(key) = key {
            scheduler.discard(key);
        }
    }
}

impl<T: Send + 'static> fmt::Debug for AsyncActor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("AsyncActor")
                .field("label", &inner.label)
                .field("state", &inner.state)
                .finish(),
            Err(_) => f.write_str("AsyncActor { <borrowed> }"),
        }
    }
}

impl<T: Send + 'static> ScenarioActor for AsyncActor<T> {
    fn start(&mut self) {
        // Failures are already recorded in the actor's state
        let _ = self.submit();
    }

    fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    fn has_failed(&self) -> bool {
        self.state() == ActorState::Failed
    }

    fn cancel(&mut self) {
        AsyncActor::cancel(self);
    }

    fn label(&self) -> String {
        self.inner.borrow().label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::AnimationScheduler;
    use std::cell::Cell;
    use std::time::Duration;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn test_result_arrives_on_next_tick() {
        let scheduler = AnimationScheduler::new();
        let got = Rc::new(Cell::new(0));
        let g = got.clone();
        let actor = AsyncActor::new(&scheduler.handle(), || Ok::<_, String>(42))
            .on_complete(move |result| g.set(result.unwrap_or(-1)));

        actor.submit().unwrap();
        // Inline work already ran, but delivery waits for the tick
        assert_eq!(actor.state(), ActorState::Running);
        assert_eq!(got.get(), 0);
        assert_eq!(scheduler.in_flight_actors(), 1);

        scheduler.tick(FRAME);
        assert_eq!(actor.state(), ActorState::Completed);
        assert_eq!(got.get(), 42);
        assert_eq!(scheduler.in_flight_actors(), 0);
    }

    #[test]
    fn test_failure_is_captured() {
        let scheduler = AnimationScheduler::new();
        let actor = AsyncActor::<u8>::new(&scheduler.handle(), || Err("connection reset"));

        actor.submit().unwrap();
        scheduler.tick(FRAME);

        assert_eq!(actor.state(), ActorState::Failed);
        assert_eq!(
            actor.error(),
            Some(AnimationError::FetchFailure("connection reset".into()))
        );
    }

    #[test]
    fn test_panicking_work_is_a_failure() {
        let scheduler = AnimationScheduler::new();
        let actor = AsyncActor::<u8>::new(&scheduler.handle(), || -> std::result::Result<u8, String> {
            panic!("decoder exploded")
        });

        actor.submit().unwrap();
        scheduler.tick(FRAME);
        assert_eq!(actor.state(), ActorState::Failed);
    }

    #[test]
    fn test_cancel_before_start_prevents_dispatch() {
        let scheduler = AnimationScheduler::new();
        let ran = Rc::new(Cell::new(false));
        let r = ran.clone();
        let actor = AsyncActor::<()>::deferred(&scheduler.handle(), move || {
            r.set(true);
            Some(|| Ok::<_, String>(()))
        });

        actor.cancel();
        actor.submit().unwrap();
        assert!(!ran.get());
        assert_eq!(actor.state(), ActorState::Cancelled);
        assert_eq!(scheduler.in_flight_actors(), 0);
    }

    #[test]
    fn test_cancel_in_flight_discards_result() {
        let scheduler = AnimationScheduler::new();
        let called = Rc::new(Cell::new(false));
        let c = called.clone();
        let actor = AsyncActor::new(&scheduler.handle(), || Ok::<_, String>("bytes"))
            .on_complete(move |_| c.set(true));

        actor.submit().unwrap();
        actor.cancel();
        scheduler.tick(FRAME);

        assert_eq!(actor.state(), ActorState::Cancelled);
        assert!(!called.get());
    }

    #[test]
    fn test_deferred_none_is_skipped() {
        let scheduler = AnimationScheduler::new();
        let actor = AsyncActor::<u32>::deferred(&scheduler.handle(), || {
            None::<fn() -> std::result::Result<u32, String>>
        });

        actor.submit().unwrap();
        assert_eq!(actor.state(), ActorState::Skipped);
        assert!(actor.state().is_terminal());
    }
}
