//! Shared helpers for actor runtime integration tests

#![allow(dead_code)]

use actors::{Actor, Mailbox, Promise};
use crossbeam_channel::unbounded;
use std::time::Duration;
use types::{Error, Outcome};

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Block the test thread until `promise` resolves
pub fn wait(promise: &Promise) -> Outcome {
    let (tx, rx) = unbounded();
    promise.observe(move |outcome| {
        let _ = tx.send(outcome);
    });
    rx.recv_timeout(TIMEOUT).expect("promise did not resolve in time")
}

/// Bank account with deposit/debit writers and a balance reader
pub fn account(balance: i64) -> Actor<i64> {
    let account = Actor::new(balance);
    account.define_writer("deposit", |balance: &mut i64, (amount,): (i64,)| -> Result<i64, Error> {
        *balance += amount;
        Ok(*balance)
    });
    account.define_writer("debit", |balance: &mut i64, (amount,): (i64,)| -> Result<i64, Error> {
        if amount > *balance {
            return Err(Error::new("not enough funds"));
        }
        *balance -= amount;
        Ok(*balance)
    });
    account.define_reader("balance", |balance: &i64, ()| -> Result<i64, Error> { Ok(*balance) });
    account
}

pub fn account_mailbox(balance: i64) -> Mailbox {
    account(balance).mailbox()
}
