// tests/integration/cleaner_test.rs

use super::fake_node::FakeNode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use topom::core::redis::{PoolOptions, RedisPool};
use topom::core::tasks::pool_cleaner::PoolCleanerTask;

#[tokio::test]
async fn test_cleaner_retires_stale_clients() {
    let node = FakeNode::start().await;
    let pool = Arc::new(RedisPool::new(PoolOptions {
        idle_timeout: Duration::from_millis(100),
        ..PoolOptions::default()
    }));
    let client = pool.get_client(&node.addr).await.unwrap();
    pool.put_client(client).await.unwrap();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let task = tokio::spawn(
        PoolCleanerTask::new(pool.clone(), Duration::from_millis(20)).run(shutdown_rx),
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(pool.stats().await.idle_clients, 0);
    assert_eq!(pool.stats().await.addresses, 0);

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_cleaner_exits_when_pool_closes() {
    let pool = Arc::new(RedisPool::new(PoolOptions::default()));
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let task = tokio::spawn(
        PoolCleanerTask::new(pool.clone(), Duration::from_millis(10)).run(shutdown_rx),
    );

    pool.close().await;
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();
}
