//! Worker Pool Scheduler
//!
//! A fixed pool of worker threads servicing two queues:
//!
//! - **ready**: FIFO of work runnable now
//! - **delayed**: min-heap of `(deadline, sequence)` so equal deadlines
//!   run in insertion order
//!
//! Workers poll the delayed heap themselves (no timer thread); a due
//! delayed item is preferred over ready work. [`Scheduler`] is a cheap
//! clonable handle. The pool shuts down when the last handle is dropped:
//! ready work still drains, delayed work that has not come due is
//! discarded.

use crate::error::catch_panic;
use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// A unit of work executed by a worker thread
pub type Work = Box<dyn FnOnce() + Send + 'static>;

struct Delayed {
    deadline: Instant,
    sequence: u64,
    work: Work,
}

impl PartialEq for Delayed {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.sequence == other.sequence
    }
}

impl Eq for Delayed {}

impl PartialOrd for Delayed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Delayed {
    // Reversed so the BinaryHeap pops the earliest deadline first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<Work>,
    delayed: BinaryHeap<Delayed>,
    next_sequence: u64,
    active: usize,
    stopping: bool,
}

impl QueueState {
    /// Next runnable item, if any, relative to `now`
    fn next_work(&mut self, now: Instant) -> Option<Work> {
        if self
            .delayed
            .peek()
            .is_some_and(|delayed| delayed.deadline <= now)
        {
            return self.delayed.pop().map(|delayed| delayed.work);
        }
        self.ready.pop_front()
    }
}

#[derive(Default)]
struct Shared {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl Shared {
    fn run_worker(&self, index: usize) {
        debug!(worker = index, "Worker started");
        let mut state = self.state.lock();
        loop {
            if let Some(work) = state.next_work(Instant::now()) {
                state.active += 1;
                drop(state);

                if let Err(err) = catch_panic("scheduled work", work) {
                    error!(worker = index, error = %err, "Scheduled work panicked");
                }

                state = self.state.lock();
                state.active -= 1;
                continue;
            }

            if state.stopping {
                break;
            }

            match state.delayed.peek().map(|delayed| delayed.deadline) {
                Some(deadline) => {
                    self.available.wait_until(&mut state, deadline);
                }
                None => self.available.wait(&mut state),
            }
        }
        debug!(worker = index, "Worker stopped");
    }
}

struct Pool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl Drop for Pool {
    fn drop(&mut self) {
        let discarded = {
            let mut state = self.shared.state.lock();
            state.stopping = true;
            std::mem::take(&mut state.delayed)
        };
        self.shared.available.notify_all();

        // Dropped outside the lock: discarded work may own promises
        if !discarded.is_empty() {
            debug!(discarded = discarded.len(), "Discarding delayed work on shutdown");
        }
        drop(discarded);

        let current = thread::current().id();
        for worker in self.workers.drain(..) {
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                error!("Worker thread terminated abnormally");
            }
        }
        info!("Scheduler stopped");
    }
}

/// Handle to a shared worker pool
#[derive(Clone)]
pub struct Scheduler {
    pool: Arc<Pool>,
}

impl Scheduler {
    /// Start a pool with `threads` workers; zero is clamped to one
    pub fn new(threads: usize) -> Self {
        let threads = if threads == 0 {
            warn!("Scheduler requested with 0 workers, using 1");
            1
        } else {
            threads
        };

        let shared = Arc::new(Shared::default());
        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("actors-worker-{index}"))
                .spawn(move || worker_shared.run_worker(index));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => error!(worker = index, error = %err, "Failed to spawn worker thread"),
            }
        }

        info!(workers = workers.len(), "Scheduler started");
        Self {
            pool: Arc::new(Pool { shared, workers }),
        }
    }

    /// Enqueue `work` to run as soon as a worker is free
    pub fn schedule<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let shared = &self.pool.shared;
        shared.state.lock().ready.push_back(Box::new(work));
        shared.available.notify_one();
    }

    /// Enqueue `work` to run no earlier than `delay` from now
    pub fn schedule_delayed<F>(&self, delay: Duration, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let deadline = Instant::now() + delay;
        let shared = &self.pool.shared;
        {
            let mut state = shared.state.lock();
            let sequence = state.next_sequence;
            state.next_sequence += 1;
            state.delayed.push(Delayed {
                deadline,
                sequence,
                work: Box::new(work),
            });
        }
        // Wake a worker so it can shorten its wait if this deadline is earliest
        shared.available.notify_one();
    }

    /// Work scheduled but not yet completed, running work included
    pub fn pending_count(&self) -> usize {
        let state = self.pool.shared.state.lock();
        state.ready.len() + state.delayed.len() + state.active
    }

    pub fn worker_count(&self) -> usize {
        self.pool.workers.len()
    }

    /// Whether both handles drive the same pool
    pub fn ptr_eq(&self, other: &Scheduler) -> bool {
        Arc::ptr_eq(&self.pool, &other.pool)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        let threads = thread::available_parallelism().map_or(1, |n| n.get());
        Self::new(threads)
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("workers", &self.worker_count())
            .field("pending", &self.pending_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_schedule_runs_all_work() {
        let scheduler = Scheduler::new(4);
        let (tx, rx) = unbounded();
        for i in 0..100 {
            let tx = tx.clone();
            scheduler.schedule(move || tx.send(i).unwrap());
        }
        let mut seen: Vec<i32> = (0..100).map(|_| rx.recv_timeout(TIMEOUT).unwrap()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_workers_clamped() {
        let scheduler = Scheduler::new(0);
        assert_eq!(scheduler.worker_count(), 1);
        let (tx, rx) = unbounded();
        scheduler.schedule(move || tx.send(()).unwrap());
        rx.recv_timeout(TIMEOUT).unwrap();
    }

    #[test]
    fn test_delayed_ties_run_in_insertion_order() {
        let scheduler = Scheduler::new(1);
        let (gate_tx, gate_rx) = unbounded::<()>();
        let (tx, rx) = unbounded();

        // Hold the only worker so every delayed item comes due before it is polled
        scheduler.schedule(move || {
            gate_rx.recv_timeout(TIMEOUT).unwrap();
        });
        for i in 0..10 {
            let tx = tx.clone();
            scheduler.schedule_delayed(Duration::from_millis(5), move || tx.send(i).unwrap());
        }
        thread::sleep(Duration::from_millis(50));
        gate_tx.send(()).unwrap();

        let order: Vec<i32> = (0..10).map(|_| rx.recv_timeout(TIMEOUT).unwrap()).collect();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_delay_is_respected() {
        let scheduler = Scheduler::new(2);
        let (tx, rx) = unbounded();
        let start = Instant::now();
        scheduler.schedule_delayed(Duration::from_millis(100), move || {
            tx.send(Instant::now()).unwrap();
        });
        let ran_at = rx.recv_timeout(TIMEOUT).unwrap();
        assert!(ran_at.duration_since(start) >= Duration::from_millis(100));
    }

    #[test]
    fn test_earlier_deadline_runs_first() {
        let scheduler = Scheduler::new(1);
        let (tx, rx) = unbounded();
        let late = tx.clone();
        scheduler.schedule_delayed(Duration::from_millis(200), move || late.send("late").unwrap());
        scheduler.schedule_delayed(Duration::from_millis(20), move || tx.send("early").unwrap());
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), "early");
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), "late");
    }

    #[test]
    fn test_pending_count_reaches_zero() {
        let scheduler = Scheduler::new(2);
        let (gate_tx, gate_rx) = unbounded::<()>();
        let gate_rx2 = gate_rx.clone();
        scheduler.schedule(move || {
            gate_rx.recv_timeout(TIMEOUT).unwrap();
        });
        scheduler.schedule(move || {
            gate_rx2.recv_timeout(TIMEOUT).unwrap();
        });
        scheduler.schedule_delayed(Duration::from_millis(10), || {});
        assert_eq!(scheduler.pending_count(), 3);

        gate_tx.send(()).unwrap();
        gate_tx.send(()).unwrap();
        let deadline = Instant::now() + TIMEOUT;
        while scheduler.pending_count() > 0 {
            assert!(Instant::now() < deadline, "scheduler never went quiet");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_panicking_work_keeps_worker_alive() {
        let scheduler = Scheduler::new(1);
        scheduler.schedule(|| {
            panic!("work failed");
        });
        let (tx, rx) = unbounded();
        scheduler.schedule(move || tx.send(()).unwrap());
        rx.recv_timeout(TIMEOUT).unwrap();
    }

    #[test]
    fn test_drop_drains_ready_work() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let scheduler = Scheduler::new(2);
            for _ in 0..50 {
                let counter = Arc::clone(&counter);
                scheduler.schedule(move || {
                    counter.fetch_add(1, AtomicOrdering::SeqCst);
                });
            }
            scheduler.schedule_delayed(Duration::from_secs(60), || {
                unreachable!("discarded on shutdown");
            });
        }
        assert_eq!(counter.load(AtomicOrdering::SeqCst), 50);
    }

    #[test]
    fn test_drop_from_worker_thread() {
        let (tx, rx) = unbounded();
        let scheduler = Scheduler::new(1);
        let handle = scheduler.clone();
        drop(scheduler);
        let submitter = handle.clone();
        // The last handle may be released while running on the pool's own worker
        submitter.schedule(move || {
            drop(handle);
            tx.send(()).unwrap();
        });
        drop(submitter);
        rx.recv_timeout(TIMEOUT).unwrap();
    }
}
