//! Property tests for FIFO-with-exclusion dispatch
//!
//! Every balance read must observe exactly the deposits submitted before
//! it, whatever the mix of readers and writers.

mod common;

use actors::Scheduler;
use common::*;
use proptest::prelude::*;
use types::{list, Outcome, Value};

#[derive(Debug, Clone)]
enum Step {
    Deposit(i64),
    Balance,
}

fn arb_steps() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        prop_oneof![
            (1i64..1000).prop_map(Step::Deposit),
            Just(Step::Balance),
        ],
        1..40,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn reads_observe_prefix_of_writes(steps in arb_steps(), workers in 1usize..6) {
        let scheduler = Scheduler::new(workers);
        let mailbox = account_mailbox(0);

        let mut expected = 0i64;
        let mut checks = Vec::new();
        for step in &steps {
            match step {
                Step::Deposit(amount) => {
                    expected += amount;
                    checks.push((mailbox.send(&scheduler, "deposit", list![*amount]), expected));
                }
                Step::Balance => {
                    checks.push((mailbox.send(&scheduler, "balance", list![]), expected));
                }
            }
        }

        for (promise, balance) in checks {
            prop_assert_eq!(wait(&promise), Outcome::Value(Value::from(balance)));
        }
    }
}
