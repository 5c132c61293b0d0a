//! Actor host service
//!
//! Loads a runtime configuration, instantiates the configured actors and
//! serves them over request/reply sockets. The `actor-host` binary wraps
//! this library with a command line.

pub mod account;
pub mod host;

pub use host::{default_registry, tcp_config, BoundModule, Host};
