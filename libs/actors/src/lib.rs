//! Actor Runtime
//!
//! In-process actors over a shared worker pool. Callers talk to an actor
//! only through its [`Mailbox`], always get a [`Promise`] back immediately
//! and observe the [`Outcome`](types::Outcome) through continuations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ send(name, args) ┌────────────────────────────────┐
//! │    Caller    │─────────────────▶│ Mailbox                        │
//! │              │◀─────────────────│  └─ Actor: name → (access, fn) │
//! └──────────────┘     Promise      │      └─ DispatchQueue          │
//!        ▲                          │          FIFO with exclusion   │
//!        │ then_result / fail       └───────────────┬────────────────┘
//!        │                                          │ admitted jobs
//!        │                          ┌───────────────▼────────────────┐
//!        └──────────────────────────│ Scheduler: N workers           │
//!             continuations         │  ready FIFO + delayed min-heap │
//!                                   └────────────────────────────────┘
//! ```
//!
//! - **Readers** run alongside other readers; **writers** run alone
//! - Operations on one actor are admitted in submission order
//! - Continuations always run on the scheduler, never inline
//!
//! # Examples
//!
//! ```rust
//! use actors::{Actor, Scheduler};
//! use types::{list, Error};
//!
//! let scheduler = Scheduler::new(2);
//! let account = Actor::new(0i64);
//! account.define_writer("deposit", |balance: &mut i64, (amount,): (i64,)| -> Result<i64, Error> {
//!     *balance += amount;
//!     Ok(*balance)
//! });
//!
//! let (tx, rx) = std::sync::mpsc::channel();
//! account
//!     .mailbox()
//!     .send(&scheduler, "deposit", list![100])
//!     .then_result(move |balance| -> Result<(), Error> {
//!         tx.send(balance).ok();
//!         Ok(())
//!     });
//! assert_eq!(rx.recv().unwrap(), types::Value::from(100));
//! ```

pub mod actor;
pub mod dispatch;
pub mod error;
pub mod factory;
pub mod function;
pub mod group;
pub mod mailbox;
pub mod promise;
pub mod queue;
pub mod scheduler;

pub use actor::{Actor, ActorId, StatelessActor};
pub use dispatch::DispatchQueue;
pub use error::DispatchError;
pub use factory::{ActorFactory, FactoryRegistry};
pub use function::{Access, Function};
pub use group::Group;
pub use mailbox::{Mailbox, MailboxInterface};
pub use promise::Promise;
pub use queue::Queue;
pub use scheduler::{Scheduler, Work};
