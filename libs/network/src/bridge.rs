//! Promise to future bridge
//!
//! Lets async code await a [`Promise`] without blocking a runtime thread.

use actors::Promise;
use std::future::Future;
use tokio::sync::oneshot;
use types::{Error, Value};

/// Await `promise`'s outcome
///
/// A promise dropped without ever being resolved yields a
/// `promise dropped` error.
pub fn into_future(promise: &Promise) -> impl Future<Output = Result<Value, Error>> + Send + 'static {
    let (tx, rx) = oneshot::channel();
    promise.observe(move |outcome| {
        let _ = tx.send(outcome.into_result());
    });
    async move {
        rx.await
            .unwrap_or_else(|_| Err(Error::new("promise dropped")))
    }
}
