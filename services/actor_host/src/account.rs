//! Built-in `account` actor
//!
//! Holds a balance of funds. `deposit` and `debit` are writers, `balance`
//! is a reader, so balance queries run alongside each other but never
//! observe a half-applied update.

use actors::{Actor, Mailbox};
use types::{Error, Map};

/// Name the factory is registered under
pub const FACTORY: &str = "account";

/// Configuration key holding the starting funds
pub const INITIAL_FUNDS: &str = "initial_funds";

fn check_amount(amount: f64) -> Result<f64, Error> {
    if amount <= 0.0 {
        return Err(Error::new("invalid amount"));
    }
    Ok(amount)
}

pub fn account(initial_funds: f64) -> Actor<f64> {
    let account = Actor::new(initial_funds);
    account.define_writer("deposit", |funds: &mut f64, (amount,): (f64,)| -> Result<f64, Error> {
        *funds += check_amount(amount)?;
        Ok(*funds)
    });
    account.define_writer("debit", |funds: &mut f64, (amount,): (f64,)| -> Result<f64, Error> {
        let amount = check_amount(amount)?;
        if *funds < amount {
            return Err(Error::new("not enough funds"));
        }
        *funds -= amount;
        Ok(*funds)
    });
    account.define_reader("balance", |funds: &f64, ()| -> Result<f64, Error> { Ok(*funds) });
    account
}

/// Factory entry point; `initial_funds` defaults to zero
pub fn create(configuration: &Map) -> Result<Mailbox, Error> {
    let initial_funds = match configuration.find(INITIAL_FUNDS) {
        Some(_) => configuration.get::<f64>(INITIAL_FUNDS)?,
        None => 0.0,
    };
    Ok(account(initial_funds).mailbox())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actors::{Promise, Scheduler};
    use std::time::{Duration, Instant};
    use types::{list, map, Outcome, Value};

    fn wait(promise: &Promise) -> Outcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !promise.is_resolved() {
            assert!(Instant::now() < deadline, "promise never resolved");
            std::thread::sleep(Duration::from_millis(1));
        }
        promise.outcome()
    }

    #[test]
    fn test_account_operations() {
        let scheduler = Scheduler::new(2);
        let mailbox = create(&map! {"initial_funds" => 100}).unwrap();

        let deposit = mailbox.send(&scheduler, "deposit", list![50.5]);
        assert_eq!(wait(&deposit), Outcome::Value(Value::from(150.5)));

        let debit = mailbox.send(&scheduler, "debit", list![500]);
        assert_eq!(wait(&debit), Outcome::Error(Error::new("not enough funds")));

        let debit = mailbox.send(&scheduler, "debit", list![-1]);
        assert_eq!(wait(&debit), Outcome::Error(Error::new("invalid amount")));

        let balance = mailbox.send(&scheduler, "balance", list![]);
        assert_eq!(wait(&balance), Outcome::Value(Value::from(150.5)));
    }

    #[test]
    fn test_configuration() {
        let scheduler = Scheduler::new(1);
        let empty = create(&Map::new()).unwrap();
        let balance = empty.send(&scheduler, "balance", list![]);
        assert_eq!(wait(&balance), Outcome::Value(Value::from(0.0)));

        let err = create(&map! {"initial_funds" => "lots"}).unwrap_err();
        assert_eq!(err.message(), "invalid cast in key initial_funds from type String to Float");
    }
}
