//! Mailbox groups
//!
//! A [`Group`] routes `member/method` paths to member mailboxes and wraps
//! every reply as a map `{source, value, error}`. Replies that already
//! carry a `source` (a nested group) pass through with `member/` prefixed.

use crate::error::DispatchError;
use crate::mailbox::{Mailbox, MailboxInterface};
use crate::promise::Promise;
use crate::scheduler::Scheduler;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use types::{map, Error, List, Outcome, Value};

#[derive(Default)]
struct Members {
    mailboxes: RwLock<BTreeMap<String, Mailbox>>,
}

impl Members {
    fn reply(source: String, outcome: Outcome) -> Value {
        match outcome {
            Outcome::Error(error) => Value::from(map! {
                "source" => source,
                "value" => Value::Null,
                "error" => error.into_message(),
            }),
            other => Value::from(map! {
                "source" => source,
                "value" => other.into_result().unwrap_or_default(),
                "error" => Value::Null,
            }),
        }
    }

    fn prefix_nested(member: &str, value: &Value) -> Option<Value> {
        let reply = value.as_map()?;
        let source = reply.get::<String>("source").ok()?;
        reply.set("source", format!("{member}/{source}"));
        Some(value.clone())
    }
}

impl MailboxInterface for Members {
    fn send(&self, scheduler: &Scheduler, path: &str, arguments: List) -> Promise {
        let promise = Promise::new(scheduler.clone());

        let Some((member, method)) = path.split_once('/') else {
            promise.set_result(Error::from(DispatchError::InvalidPath {
                path: path.to_string(),
            }));
            return promise;
        };

        let Some(mailbox) = self.mailboxes.read().get(member).cloned() else {
            promise.set_result(Error::from(DispatchError::UnknownMember {
                member: member.to_string(),
            }));
            return promise;
        };

        let reply = promise.clone();
        let member = member.to_string();
        let source = path.to_string();
        mailbox
            .send(scheduler, method, arguments)
            .observe(move |outcome| {
                let wrapped = outcome
                    .value()
                    .and_then(|value| Members::prefix_nested(&member, value))
                    .unwrap_or_else(|| Members::reply(source, outcome));
                reply.set_result(wrapped);
            });
        promise
    }
}

/// Named collection of mailboxes addressed by `member/method`
#[derive(Clone, Default)]
pub struct Group {
    members: Arc<Members>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a member
    pub fn add(&self, name: impl Into<String>, mailbox: Mailbox) {
        self.members.mailboxes.write().insert(name.into(), mailbox);
    }

    pub fn remove(&self, name: &str) -> Option<Mailbox> {
        self.members.mailboxes.write().remove(name)
    }

    pub fn find(&self, name: &str) -> Option<Mailbox> {
        self.members.mailboxes.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.members.mailboxes.read().keys().cloned().collect()
    }

    pub fn mailbox(&self) -> Mailbox {
        Mailbox::new(self.members.clone())
    }
}
