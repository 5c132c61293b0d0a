//! # Value Model
//!
//! Dynamically-typed data shared by the actor runtime, its codecs and its
//! transports.
//!
//! - [`Value`]: closed sum of `Null | Bool | Int | UInt | Float | String | List | Map`
//! - [`List`] / [`Map`]: shared-by-default containers with explicit
//!   [`deep_copy`](Value::deep_copy)
//! - [`Outcome`]: the value-or-error payload resolving an operation
//! - [`Error`]: message-only error surfaced through promises
//!
//! ```rust
//! use types::{list, map, Value};
//!
//! let account = map! {"owner" => "alice", "history" => list![100, -50]};
//! let shared = Value::from(account.clone());
//! let snapshot = shared.deep_copy();
//!
//! account.set("owner", "bob");
//! assert_eq!(shared.as_map().and_then(|m| m.find("owner")), Some(Value::from("bob")));
//! assert_eq!(snapshot.as_map().and_then(|m| m.find("owner")), Some(Value::from("alice")));
//! ```

pub mod convert;
pub mod error;
pub mod list;
pub mod map;
pub mod outcome;
pub mod value;

#[cfg(feature = "serialization")]
pub mod serialization;

pub use convert::{FromArgs, FromValue, IntoOutcome};
pub use error::{Error, ValueError};
pub use list::{List, ListIter};
pub use map::{Map, MapIter};
pub use outcome::{Outcome, OutcomeType};
pub use value::{Value, ValueType};
