// tests/integration/cli_test.rs

use super::fake_node::{FakeNode, NodeState};
use topom::cli::{self, Command};
use topom::core::redis::{PoolOptions, RedisPool};

#[tokio::test]
async fn test_execute_slots_and_returns_client() {
    let node = FakeNode::with_state(NodeState {
        slots: vec![(3, 42)],
        ..NodeState::default()
    })
    .await;
    let pool = RedisPool::new(PoolOptions::default());

    let out = cli::execute(
        &pool,
        &Command::Slots {
            addr: node.addr.clone(),
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "slot-0003 42");
    assert_eq!(pool.idle_count(&node.addr).await, 1);
}

#[tokio::test]
async fn test_execute_maxmemory_unlimited() {
    let node = FakeNode::start().await;
    let pool = RedisPool::new(PoolOptions::default());
    let out = cli::execute(
        &pool,
        &Command::MaxMemory {
            addr: node.addr.clone(),
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "unlimited");
}

#[tokio::test]
async fn test_execute_slaveof_then_master() {
    let node = FakeNode::start().await;
    let pool = RedisPool::new(PoolOptions::default());

    cli::execute(
        &pool,
        &Command::SlaveOf {
            addr: node.addr.clone(),
            master: "127.0.0.1:7000".to_string(),
        },
    )
    .await
    .unwrap();
    let out = cli::execute(
        &pool,
        &Command::Master {
            addr: node.addr.clone(),
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "127.0.0.1:7000");

    cli::execute(
        &pool,
        &Command::Promote {
            addr: node.addr.clone(),
        },
    )
    .await
    .unwrap();
    assert_eq!(node.connections(), 1);
}

#[tokio::test]
async fn test_execute_migrate_fails_on_status() {
    let node = FakeNode::with_state(NodeState {
        migrate_reply: vec![1, 0],
        ..NodeState::default()
    })
    .await;
    let pool = RedisPool::new(PoolOptions::default());

    let err = cli::execute(
        &pool,
        &Command::Migrate {
            src: node.addr.clone(),
            dst: "127.0.0.1:7001".to_string(),
            slot: 9,
        },
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("slot-0009"));
    // The client itself is still healthy, so it went back to the pool.
    assert_eq!(pool.idle_count(&node.addr).await, 1);
}

#[tokio::test]
async fn test_execute_failed_client_is_not_returned() {
    let node = FakeNode::start().await;
    node.state.lock().hang_up = true;
    let pool = RedisPool::new(PoolOptions::default());

    assert!(
        cli::execute(
            &pool,
            &Command::Info {
                addr: node.addr.clone(),
            },
        )
        .await
        .is_err()
    );
    assert_eq!(pool.idle_count(&node.addr).await, 0);
}
