//! Closable multi-producer value queue
//!
//! Bridges actor callbacks into plain threads: workers `push`, a consumer
//! blocks in `pop` until a value arrives or the queue is closed.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use types::{List, Value};

#[derive(Default)]
struct QueueState {
    values: VecDeque<Value>,
    closed: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<QueueState>,
    available: Condvar,
}

#[derive(Clone, Default)]
pub struct Queue {
    shared: Arc<Shared>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value; `false` once closed
    pub fn push(&self, value: impl Into<Value>) -> bool {
        let mut state = self.shared.state.lock();
        if state.closed {
            return false;
        }
        state.values.push_back(value.into());
        self.shared.available.notify_one();
        true
    }

    /// Block until a value is available; `None` once closed and drained
    pub fn pop(&self) -> Option<Value> {
        let mut state = self.shared.state.lock();
        while state.values.is_empty() && !state.closed {
            self.shared.available.wait(&mut state);
        }
        state.values.pop_front()
    }

    /// Move everything queued into `list` without blocking
    pub fn drain_into(&self, list: &List) -> bool {
        let mut state = self.shared.state.lock();
        if state.values.is_empty() {
            return false;
        }
        for value in state.values.drain(..) {
            list.append(value);
        }
        true
    }

    pub fn count(&self) -> usize {
        self.shared.state.lock().values.len()
    }

    /// Reject further pushes and wake every blocked consumer
    pub fn close(&self) {
        self.shared.state.lock().closed = true;
        self.shared.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_push_pop_order() {
        let queue = Queue::new();
        assert!(queue.push(1));
        assert!(queue.push("two"));
        assert_eq!(queue.count(), 2);
        assert_eq!(queue.pop(), Some(Value::from(1)));
        assert_eq!(queue.pop(), Some(Value::from("two")));
        assert_eq!(queue.count(), 0);
    }

    #[test]
    fn test_close_wakes_blocked_consumer() {
        let queue = Queue::new();
        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.pop())
        };
        thread::sleep(Duration::from_millis(20));
        queue.close();
        assert_eq!(consumer.join().unwrap(), None);
        assert!(queue.is_closed());
        assert!(!queue.push(3));
    }

    #[test]
    fn test_pop_drains_after_close() {
        let queue = Queue::new();
        queue.push(1);
        queue.close();
        assert_eq!(queue.pop(), Some(Value::from(1)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_drain_into() {
        let queue = Queue::new();
        let list = List::new();
        assert!(!queue.drain_into(&list));
        for i in 0..3 {
            queue.push(i);
        }
        assert!(queue.drain_into(&list));
        assert_eq!(list.to_string(), "[0, 1, 2]");
        assert_eq!(queue.count(), 0);
    }

    #[test]
    fn test_cross_thread_producers() {
        let queue = Queue::new();
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        queue.push(p * 100 + i);
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        let mut received = 0;
        while queue.count() > 0 {
            assert!(queue.pop().is_some());
            received += 1;
        }
        assert_eq!(received, 100);
    }
}
