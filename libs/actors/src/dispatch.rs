//! Reader/writer dispatch queue
//!
//! Each actor owns one [`DispatchQueue`]. Submitted jobs are tagged with
//! their [`Access`] and admitted strictly in submission order:
//!
//! - consecutive readers at the head are admitted together while no
//!   writer runs
//! - a writer at the head is admitted only once every running reader has
//!   finished, and then runs alone
//! - nothing behind a waiting writer is admitted, so readers never jump a
//!   writer and a writer never waits on readers submitted after it
//!
//! Admitted jobs are handed to the scheduler; the queue never blocks a
//! worker thread.

use crate::actor::ActorId;
use crate::error::catch_panic;
use crate::function::Access;
use crate::scheduler::Scheduler;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Task {
    access: Access,
    scheduler: Scheduler,
    job: Job,
}

#[derive(Default)]
struct DispatchState {
    queue: VecDeque<Task>,
    readers: usize,
    writer: bool,
}

impl DispatchState {
    fn admit(&mut self) -> Vec<Task> {
        let mut admitted = Vec::new();
        while !self.writer {
            let Some(access) = self.queue.front().map(|task| task.access) else {
                break;
            };
            match access {
                Access::Reader => {
                    self.readers += 1;
                }
                Access::Writer if self.readers == 0 => {
                    self.writer = true;
                }
                Access::Writer => break,
            }
            if let Some(task) = self.queue.pop_front() {
                admitted.push(task);
            }
        }
        admitted
    }

    fn complete(&mut self, access: Access) {
        match access {
            Access::Reader => self.readers -= 1,
            Access::Writer => self.writer = false,
        }
    }
}

/// FIFO-with-exclusion queue serializing one actor's operations
pub struct DispatchQueue {
    actor_id: ActorId,
    state: Mutex<DispatchState>,
}

impl DispatchQueue {
    pub fn new(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            state: Mutex::new(DispatchState::default()),
        }
    }

    pub fn actor_id(&self) -> &ActorId {
        &self.actor_id
    }

    /// Queue `job`; it runs on `scheduler` once its access mode allows
    pub fn submit<F>(self: &Arc<Self>, scheduler: &Scheduler, access: Access, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let admitted = {
            let mut state = self.state.lock();
            state.queue.push_back(Task {
                access,
                scheduler: scheduler.clone(),
                job: Box::new(job),
            });
            state.admit()
        };
        self.launch(admitted);
    }

    /// Jobs queued but not yet admitted
    pub fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Jobs admitted and still running
    pub fn running(&self) -> usize {
        let state = self.state.lock();
        state.readers + usize::from(state.writer)
    }

    fn launch(self: &Arc<Self>, admitted: Vec<Task>) {
        if admitted.is_empty() {
            return;
        }
        debug!(
            actor_id = %self.actor_id,
            admitted = admitted.len(),
            access = %admitted[0].access,
            "Admitting operations"
        );
        for task in admitted {
            let queue = Arc::clone(self);
            let Task {
                access,
                scheduler,
                job,
            } = task;
            scheduler.schedule(move || {
                if let Err(err) = catch_panic("dispatched job", job) {
                    warn!(actor_id = %queue.actor_id, error = %err, "Dispatched job panicked");
                }
                queue.finish(access);
            });
        }
    }

    fn finish(self: &Arc<Self>, access: Access) {
        let admitted = {
            let mut state = self.state.lock();
            state.complete(access);
            state.admit()
        };
        self.launch(admitted);
    }
}
