//! Mailbox
//!
//! The externally visible handle of anything that accepts named messages:
//! local actors, groups and remote requesters all implement
//! [`MailboxInterface`] and are used through the same [`Mailbox`].

use crate::promise::Promise;
use crate::scheduler::Scheduler;
use std::fmt;
use std::sync::Arc;
use types::List;

/// Message sink behind a [`Mailbox`]
pub trait MailboxInterface: Send + Sync + 'static {
    /// Deliver `name(arguments)`; the promise is returned before any work runs
    fn send(&self, scheduler: &Scheduler, name: &str, arguments: List) -> Promise;
}

/// Copyable handle keeping its target alive
#[derive(Clone)]
pub struct Mailbox {
    target: Arc<dyn MailboxInterface>,
}

impl Mailbox {
    pub fn new(target: Arc<dyn MailboxInterface>) -> Self {
        Self { target }
    }

    pub fn from_interface<M: MailboxInterface>(target: M) -> Self {
        Self::new(Arc::new(target))
    }

    pub fn send(&self, scheduler: &Scheduler, name: &str, arguments: List) -> Promise {
        self.target.send(scheduler, name, arguments)
    }

    /// Whether both handles address the same target
    pub fn ptr_eq(&self, other: &Mailbox) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
    }
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Mailbox")
    }
}
