//! Promise / continuation engine
//!
//! A [`Promise`] is a single-assignment future bound to one [`Scheduler`].
//! Continuations are registered in a list under the promise's lock and,
//! once the promise resolves, every one of them is *scheduled* on the
//! bound scheduler. Nothing runs inline on the resolving thread, so long
//! chains never grow the call stack.
//!
//! Resolution rules:
//!
//! - only the first resolution wins; later attempts return `false`
//! - an undefined outcome resolves to `Null`
//! - adopting another promise ([`Promise::set_promise`]) registers a
//!   continuation on it and does not reserve this promise, so a direct
//!   [`Promise::set_result`] racing the adoption can still win (timeouts)
//! - an error skips `then_*` continuations and propagates unchanged

use crate::error::catch_panic;
use crate::scheduler::Scheduler;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::trace;
use types::{Error, IntoOutcome, Outcome, Value};

type Continuation = Box<dyn FnOnce(Outcome) + Send + 'static>;

#[derive(Default)]
struct PromiseState {
    resolved: Option<Outcome>,
    continuations: Vec<Continuation>,
}

struct PromiseInner {
    scheduler: Scheduler,
    state: Mutex<PromiseState>,
}

/// Scheduler-bound, single-resolution future
#[derive(Clone)]
pub struct Promise {
    inner: Arc<PromiseInner>,
}

impl Promise {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            inner: Arc::new(PromiseInner {
                scheduler,
                state: Mutex::new(PromiseState::default()),
            }),
        }
    }

    /// A promise already resolved with `outcome`
    pub fn resolved(scheduler: Scheduler, outcome: impl Into<Outcome>) -> Self {
        let promise = Self::new(scheduler);
        promise.set_result(outcome);
        promise
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.state.lock().resolved.is_some()
    }

    /// Current state; `Undefined` while pending
    pub fn outcome(&self) -> Outcome {
        self.inner
            .state
            .lock()
            .resolved
            .clone()
            .unwrap_or_default()
    }

    /// Resolve with a value or error
    ///
    /// Returns `false`, leaving the first resolution untouched, if the
    /// promise was already resolved.
    pub fn set_result(&self, outcome: impl Into<Outcome>) -> bool {
        let outcome = match outcome.into() {
            Outcome::Undefined => Outcome::Value(Value::Null),
            defined => defined,
        };

        let continuations = {
            let mut state = self.inner.state.lock();
            if state.resolved.is_some() {
                trace!(outcome = %outcome, "Ignoring resolution of an already resolved promise");
                return false;
            }
            state.resolved = Some(outcome.clone());
            std::mem::take(&mut state.continuations)
        };

        for continuation in continuations {
            let outcome = outcome.clone();
            self.inner
                .scheduler
                .schedule(move || continuation(outcome));
        }
        true
    }

    /// Resolve with whatever `other` eventually resolves to
    ///
    /// Returns `false` if this promise is already resolved.
    pub fn set_promise(&self, other: &Promise) -> bool {
        if self.is_resolved() {
            trace!("Ignoring adoption by an already resolved promise");
            return false;
        }
        let this = self.clone();
        other.observe(move |outcome| {
            this.set_result(outcome);
        });
        true
    }

    /// Run `observer` on the scheduler once resolved, whatever the outcome
    pub fn observe<F>(&self, observer: F)
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        let resolved = {
            let mut state = self.inner.state.lock();
            match &state.resolved {
                Some(outcome) => outcome.clone(),
                None => {
                    state.continuations.push(Box::new(observer));
                    return;
                }
            }
        };
        self.inner.scheduler.schedule(move || observer(resolved));
    }

    /// Chain a step that runs on success and produces an outcome
    pub fn then_result<R, F>(&self, step: F) -> Promise
    where
        R: IntoOutcome,
        F: FnOnce(Value) -> R + Send + 'static,
    {
        let next = Promise::new(self.inner.scheduler.clone());
        let target = next.clone();
        self.observe(move |outcome| match outcome {
            Outcome::Error(error) => {
                target.set_result(error);
            }
            other => {
                let value = other.into_result().unwrap_or_default();
                let produced = catch_panic("continuation", move || step(value).into_outcome())
                    .unwrap_or_else(|err| Outcome::Error(err.into()));
                target.set_result(produced);
            }
        });
        next
    }

    /// Chain a step that runs on success and returns another promise
    pub fn then_promise<F>(&self, step: F) -> Promise
    where
        F: FnOnce(Value) -> Promise + Send + 'static,
    {
        let next = Promise::new(self.inner.scheduler.clone());
        let target = next.clone();
        self.observe(move |outcome| match outcome {
            Outcome::Error(error) => {
                target.set_result(error);
            }
            other => {
                let value = other.into_result().unwrap_or_default();
                match catch_panic("continuation", move || step(value)) {
                    Ok(inner) => {
                        target.set_promise(&inner);
                    }
                    Err(err) => {
                        target.set_result(Error::from(err));
                    }
                }
            }
        });
        next
    }

    /// Observe errors only; has no effect on success
    pub fn fail<F>(&self, handler: F)
    where
        F: FnOnce(Error) + Send + 'static,
    {
        self.observe(move |outcome| {
            if let Outcome::Error(error) = outcome {
                handler(error);
            }
        });
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("outcome", &self.outcome())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{unbounded, Receiver};
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn capture(promise: &Promise) -> Receiver<Outcome> {
        let (tx, rx) = unbounded();
        promise.observe(move |outcome| {
            let _ = tx.send(outcome);
        });
        rx
    }

    #[test]
    fn test_first_resolution_wins() {
        let promise = Promise::new(Scheduler::new(2));
        assert!(promise.set_result(Value::from(1)));
        assert!(!promise.set_result(Value::from(2)));
        assert!(!promise.set_result(Error::new("late")));
        assert_eq!(promise.outcome(), Outcome::Value(Value::from(1)));
    }

    #[test]
    fn test_undefined_resolves_to_null() {
        let promise = Promise::new(Scheduler::new(1));
        assert!(promise.set_result(Outcome::Undefined));
        assert_eq!(promise.outcome(), Outcome::Value(Value::Null));
    }

    #[test]
    fn test_pending_outcome_is_undefined() {
        let promise = Promise::new(Scheduler::new(1));
        assert!(!promise.is_resolved());
        assert!(promise.outcome().is_undefined());
    }

    #[test]
    fn test_then_result_chain() {
        let scheduler = Scheduler::new(2);
        let promise = Promise::new(scheduler);
        let chained = promise
            .then_result(|v| -> Result<i64, String> { Ok(v.get::<i64>().unwrap_or(0) + 1) })
            .then_result(|v| -> Result<i64, String> { Ok(v.get::<i64>().unwrap_or(0) * 10) });
        let rx = capture(&chained);
        promise.set_result(Value::from(4));
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), Outcome::Value(Value::from(50)));
    }

    #[test]
    fn test_then_result_short_circuits_errors() {
        let scheduler = Scheduler::new(2);
        let promise = Promise::resolved(scheduler, Error::new("boom"));
        let (called_tx, called_rx) = unbounded::<()>();
        let chained = promise.then_result(move |_| -> Result<i64, String> {
            let _ = called_tx.send(());
            Ok(1)
        });
        let rx = capture(&chained);
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), Outcome::Error(Error::new("boom")));
        assert!(called_rx.try_recv().is_err());
    }

    #[test]
    fn test_continuation_panic_becomes_error() {
        let promise = Promise::resolved(Scheduler::new(1), Value::from(1));
        let chained = promise.then_result(|_| -> Outcome { panic!("bad step") });
        let rx = capture(&chained);
        assert_eq!(
            rx.recv_timeout(TIMEOUT).unwrap(),
            Outcome::Error(Error::new("continuation panicked: bad step"))
        );
    }

    #[test]
    fn test_then_promise_flattens() {
        let scheduler = Scheduler::new(2);
        let inner_scheduler = scheduler.clone();
        let promise = Promise::resolved(scheduler, Value::from("alice"));
        let chained = promise.then_promise(move |name| {
            let greeting = format!("hello {}", name.as_str().unwrap_or_default());
            Promise::resolved(inner_scheduler, Value::from(greeting))
        });
        let rx = capture(&chained);
        assert_eq!(
            rx.recv_timeout(TIMEOUT).unwrap(),
            Outcome::Value(Value::from("hello alice"))
        );
    }

    #[test]
    fn test_set_promise_adopts_pending_and_resolved() {
        let scheduler = Scheduler::new(2);

        let source = Promise::new(scheduler.clone());
        let adopter = Promise::new(scheduler.clone());
        assert!(adopter.set_promise(&source));
        let rx = capture(&adopter);
        source.set_result(Value::from(7));
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), Outcome::Value(Value::from(7)));

        let done = Promise::resolved(scheduler.clone(), Error::new("gone"));
        let late_adopter = Promise::new(scheduler);
        assert!(late_adopter.set_promise(&done));
        let rx = capture(&late_adopter);
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), Outcome::Error(Error::new("gone")));
        assert!(!late_adopter.set_promise(&done));
    }

    #[test]
    fn test_timeout_race_first_wins() {
        let scheduler = Scheduler::new(2);
        let slow = Promise::new(scheduler.clone());
        let raced = Promise::new(scheduler.clone());
        raced.set_promise(&slow);

        let timeout = raced.clone();
        scheduler.schedule_delayed(Duration::from_millis(20), move || {
            timeout.set_result(Error::new("timeout"));
        });
        let rx = capture(&raced);
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), Outcome::Error(Error::new("timeout")));

        slow.set_result(Value::from(1));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(raced.outcome(), Outcome::Error(Error::new("timeout")));
    }

    #[test]
    fn test_fail_ignores_success() {
        let scheduler = Scheduler::new(1);
        let (tx, rx) = unbounded();

        let ok = Promise::resolved(scheduler.clone(), Value::from(1));
        let ok_tx = tx.clone();
        ok.fail(move |e| ok_tx.send(format!("ok:{}", e)).unwrap());

        let bad = Promise::resolved(scheduler, Error::new("no"));
        bad.fail(move |e| tx.send(format!("bad:{}", e)).unwrap());

        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), "bad:no");
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_continuations_registered_before_and_after() {
        let promise = Promise::new(Scheduler::new(2));
        let before = capture(&promise);
        promise.set_result(Value::from("x"));
        let after = capture(&promise);
        assert_eq!(before.recv_timeout(TIMEOUT).unwrap(), Outcome::Value(Value::from("x")));
        assert_eq!(after.recv_timeout(TIMEOUT).unwrap(), Outcome::Value(Value::from("x")));
    }
}
