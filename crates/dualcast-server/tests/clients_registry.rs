#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use dualcast_server::ClientsRegistry;

use common::RecordingConnection;

#[test]
fn add_lookup_remove_and_return_address() {
    let reg = ClientsRegistry::new();
    let conn = RecordingConnection::stream();
    reg.add("client-1", conn.clone());

    let found = reg.lookup("client-1").expect("registered");
    assert_eq!(
        Arc::as_ptr(&found) as *const (),
        Arc::as_ptr(&conn) as *const ()
    );
    assert_eq!(reg.client_ids(), vec!["client-1".to_string()]);

    let addr: SocketAddr = "10.0.0.5:7777".parse().unwrap();
    assert!(reg.update_return_address("client-1", addr));
    assert_eq!(reg.return_address("client-1"), Some(addr));

    assert!(reg.remove("client-1").is_some());
    assert!(reg.lookup("client-1").is_none());
    assert_eq!(reg.return_address("client-1"), None);
    assert!(reg.is_empty());
}

#[test]
fn unknown_clients() {
    let reg = ClientsRegistry::new();
    let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
    assert!(reg.lookup("ghost").is_none());
    assert!(reg.remove("ghost").is_none());
    assert!(!reg.update_return_address("ghost", addr));
    assert!(reg.return_address("ghost").is_none());
}

#[test]
fn snapshot_is_detached() {
    let reg = ClientsRegistry::new();
    reg.add("a", RecordingConnection::stream());
    reg.add("b", RecordingConnection::stream());

    let snap = reg.snapshot();
    reg.remove("a");
    reg.add("c", RecordingConnection::stream());

    let keys: HashSet<_> = snap.keys().cloned().collect();
    assert_eq!(keys, HashSet::from(["a".to_string(), "b".to_string()]));
    assert_eq!(reg.len(), 2);
}

#[test]
fn generated_ids_are_unique() {
    let reg = ClientsRegistry::new();
    let ids: HashSet<String> = (0..1000).map(|_| reg.generate_client_id()).collect();
    assert_eq!(ids.len(), 1000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration() {
    let reg = Arc::new(ClientsRegistry::new());
    let mut tasks = Vec::new();
    for t in 0..8 {
        let reg = Arc::clone(&reg);
        tasks.push(tokio::spawn(async move {
            for i in 0..100 {
                let id = format!("{t}-{i}");
                reg.add(id.clone(), RecordingConnection::stream());
                if i % 2 == 0 {
                    reg.remove(&id);
                }
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(reg.len(), 8 * 50);
}
