//! Network Adapters
//!
//! Socket transports that carry mailbox traffic between processes. The
//! actor core knows nothing about sockets; these adapters only call
//! `Mailbox::send` and observe the returned promises.
//!
//! ```text
//!  process A                                   process B
//! ┌───────────────────┐  [id, op, fmt, args]  ┌───────────────────┐
//! │ Requester         │──────────────────────▶│ Replier           │
//! │  (MailboxInterface)│◀──────────────────────│  └─ Mailbox.send  │
//! └───────────────────┘  [id, value, error]   └───────────────────┘
//!
//! ┌───────────────────┐ [topic, fmt, payload] ┌───────────────────┐
//! │ Publisher         │──────────────────────▶│ Subscriber        │
//! │  prefix fan-out   │                       │  └─ callback      │
//! └───────────────────┘                       └───────────────────┘
//! ```
//!
//! All frames share the multipart encoding in [`transports::tcp`].

pub mod bridge;
pub mod error;
pub mod publisher;
pub mod replier;
pub mod requester;
pub mod subscriber;
pub mod transports;

pub use bridge::into_future;
pub use error::{Result, TransportError};
pub use publisher::Publisher;
pub use replier::Replier;
pub use requester::Requester;
pub use subscriber::Subscriber;
pub use transports::TcpConfig;
