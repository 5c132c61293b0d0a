//! Actors
//!
//! [`StatelessActor`] holds a live name → (access, [`Function`]) table and
//! a [`DispatchQueue`]. [`Actor<S>`] adds one state block that typed
//! readers see as `&S` and typed writers as `&mut S`; the dispatch queue
//! already guarantees exclusion, so the lock around the state is never
//! contended.
//!
//! An actor lives as long as any [`Mailbox`] or in-flight operation
//! references it.

use crate::dispatch::DispatchQueue;
use crate::error::DispatchError;
use crate::function::{Access, Function};
use crate::mailbox::{Mailbox, MailboxInterface};
use crate::promise::Promise;
use crate::scheduler::Scheduler;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use types::{FromArgs, IntoOutcome, List};
use uuid::Uuid;

/// Unique actor identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorId {
    id: Uuid,
}

impl ActorId {
    /// Create new actor ID
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self { id }
    }

    pub fn uuid(&self) -> Uuid {
        self.id
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.id.simple())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
struct Operation {
    access: Access,
    function: Function,
}

struct ActorCore {
    dispatch: Arc<DispatchQueue>,
    operations: RwLock<HashMap<String, Operation>>,
}

impl ActorCore {
    fn id(&self) -> &ActorId {
        self.dispatch.actor_id()
    }
}

impl MailboxInterface for ActorCore {
    fn send(&self, scheduler: &Scheduler, name: &str, arguments: List) -> Promise {
        let promise = Promise::new(scheduler.clone());
        let operation = self.operations.read().get(name).cloned();
        let Some(Operation { access, function }) = operation else {
            debug!(actor_id = %self.id(), operation = name, "Unknown operation");
            promise.set_result(types::Error::from(DispatchError::unknown_operation(name)));
            return promise;
        };

        let resolve = promise.clone();
        self.dispatch.submit(scheduler, access, move || {
            resolve.set_result(function.call(arguments));
        });
        promise
    }
}

/// Actor whose functions carry any state they need themselves
#[derive(Clone)]
pub struct StatelessActor {
    core: Arc<ActorCore>,
}

impl StatelessActor {
    pub fn new() -> Self {
        Self::with_id(ActorId::new())
    }

    pub fn with_id(id: ActorId) -> Self {
        Self {
            core: Arc::new(ActorCore {
                dispatch: Arc::new(DispatchQueue::new(id)),
                operations: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn id(&self) -> &ActorId {
        self.core.id()
    }

    /// Register `function` under `name`, replacing any earlier definition
    pub fn define(&self, name: impl Into<String>, access: Access, function: Function) {
        let name = name.into();
        debug!(actor_id = %self.id(), operation = %name, access = %access, "Defining operation");
        self.core
            .operations
            .write()
            .insert(name, Operation { access, function });
    }

    pub fn define_reader(&self, name: impl Into<String>, function: Function) {
        self.define(name, Access::Reader, function);
    }

    pub fn define_writer(&self, name: impl Into<String>, function: Function) {
        self.define(name, Access::Writer, function);
    }

    /// Access mode of `name`, if defined
    pub fn access(&self, name: &str) -> Option<Access> {
        self.core.operations.read().get(name).map(|op| op.access)
    }

    /// Defined operation names, sorted
    pub fn operations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.core.operations.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Mailbox addressing this actor; later definitions remain visible through it
    pub fn mailbox(&self) -> Mailbox {
        Mailbox::new(self.core.clone())
    }
}

impl Default for StatelessActor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StatelessActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatelessActor")
            .field("id", self.id())
            .field("operations", &self.operations())
            .finish()
    }
}

/// Actor owning one `S` shared by its typed readers and writers
pub struct Actor<S> {
    state: Arc<RwLock<S>>,
    actor: StatelessActor,
}

impl<S> Clone for Actor<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            actor: self.actor.clone(),
        }
    }
}

impl<S: Send + Sync + 'static> Actor<S> {
    pub fn new(state: S) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            actor: StatelessActor::new(),
        }
    }

    pub fn id(&self) -> &ActorId {
        self.actor.id()
    }

    /// Register a typed operation that may run alongside other readers
    pub fn define_reader<A, R, F>(&self, name: impl Into<String>, reader: F)
    where
        A: FromArgs,
        R: IntoOutcome,
        F: Fn(&S, A) -> R + Send + Sync + 'static,
    {
        let state = Arc::clone(&self.state);
        self.actor.define_reader(
            name,
            Function::typed(move |args: A| reader(&state.read(), args)),
        );
    }

    /// Register a typed operation that runs alone
    pub fn define_writer<A, R, F>(&self, name: impl Into<String>, writer: F)
    where
        A: FromArgs,
        R: IntoOutcome,
        F: Fn(&mut S, A) -> R + Send + Sync + 'static,
    {
        let state = Arc::clone(&self.state);
        self.actor.define_writer(
            name,
            Function::typed(move |args: A| writer(&mut state.write(), args)),
        );
    }

    /// Untyped registration for operations handling their own arguments
    pub fn define(&self, name: impl Into<String>, access: Access, function: Function) {
        self.actor.define(name, access, function);
    }

    pub fn operations(&self) -> Vec<String> {
        self.actor.operations()
    }

    pub fn mailbox(&self) -> Mailbox {
        self.actor.mailbox()
    }
}
