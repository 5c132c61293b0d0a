//! Configured modules served over loopback sockets

use actor_host::{default_registry, BoundModule, Host};
use actors::Scheduler;
use network::{into_future, Requester, TcpConfig};
use runtime_config::RuntimeConfig;
use std::io::Write;
use std::net::SocketAddr;
use types::{list, Error, Map, Value};

const CONFIG: &str = r#"
[scheduler]
threads = 2

[[modules]]
name = "savings"
factory = "account"
listen = "127.0.0.1:0"

[modules.configuration]
initial_funds = 100

[[modules]]
name = "checking"
factory = "account"
listen = "127.0.0.1:0"

[[modules]]
name = "internal"
factory = "account"
"#;

async fn start_host() -> (Host, Vec<BoundModule>) {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    let config = RuntimeConfig::load(Some(file.path())).unwrap();

    let host = Host::build(&config, &default_registry()).unwrap();
    let bound = host.bind().await.unwrap();
    (host, bound)
}

fn addr_of(bound: &[BoundModule], name: &str) -> Option<SocketAddr> {
    bound
        .iter()
        .find(|module| module.name == name)
        .map(|module| module.local_addr().unwrap())
}

#[tokio::test]
async fn test_only_listening_modules_are_bound() {
    let (host, bound) = start_host().await;
    assert_eq!(bound.len(), 2);
    assert!(addr_of(&bound, "savings").is_some());
    assert!(addr_of(&bound, "checking").is_some());
    assert!(addr_of(&bound, "internal").is_none());
    assert!(host.mailbox("internal").is_some());
}

#[tokio::test]
async fn test_remote_account_operations() {
    let (host, bound) = start_host().await;
    let savings = addr_of(&bound, "savings").unwrap();

    let local = host.modules().mailbox();
    let scheduler = host.scheduler().clone();
    tokio::spawn(async move { host.serve(bound).await });

    let json = codec::require("json").unwrap();
    let remote = Requester::connect(savings, json, TcpConfig::default())
        .await
        .unwrap()
        .mailbox();
    let client = Scheduler::new(1);

    let deposit = remote.send(&client, "deposit", list![25]);
    assert_eq!(into_future(&deposit).await, Ok(Value::from(125.0)));

    let overdraw = remote.send(&client, "debit", list![1000]);
    assert_eq!(into_future(&overdraw).await, Err(Error::new("not enough funds")));

    // The host's group sees the same actor the replier serves
    let reply = into_future(&local.send(&scheduler, "savings/balance", list![]))
        .await
        .unwrap();
    let reply = reply.get::<Map>().unwrap();
    assert_eq!(reply.get::<f64>("value").unwrap(), 125.0);
}
