use super::*;
use breaker_coordination::fake::FakeCoordinationStore;
use tokio::sync::mpsc;

fn config(key: &str) -> ElectorConfig {
    ElectorConfig {
        key: key.to_string(),
        acquire_interval: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn becomes_leader_when_mutex_is_free() {
    let store = Arc::new(FakeCoordinationStore::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let on_role_change: OnRoleChange = Arc::new(move |role| {
        let _ = tx.send(role);
    });
    let on_error: OnError = Arc::new(|_| {});

    let elector = LeaderElector::new(store);
    elector.start(config("leader"), on_role_change, on_error).await.unwrap();

    let first = rx.recv().await.unwrap();
    assert_eq!(first, Role::Leader);
    assert!(elector.is_leader());

    elector.stop().await.unwrap();
}

#[tokio::test]
async fn second_instance_stays_follower_while_first_holds_lock() {
    let store = Arc::new(FakeCoordinationStore::new());

    let on_error: OnError = Arc::new(|_| {});
    let a_role: OnRoleChange = Arc::new(|_| {});
    let elector_a = LeaderElector::new(store.clone());
    elector_a
        .start(config("leader"), a_role, on_error.clone())
        .await
        .unwrap();

    // Give A's acquire loop a chance to win the lock.
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(elector_a.is_leader());

    let b_role: OnRoleChange = Arc::new(|_| {});
    let elector_b = LeaderElector::new(store);
    elector_b.start(config("leader"), b_role, on_error).await.unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!elector_b.is_leader());

    elector_a.stop().await.unwrap();
    elector_b.stop().await.unwrap();
}

#[tokio::test]
async fn lock_loss_reverts_role_and_callback_fires_once() {
    let store = Arc::new(FakeCoordinationStore::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let on_role_change: OnRoleChange = Arc::new(move |role| {
        let _ = tx.send(role);
    });
    let on_error: OnError = Arc::new(|_| {});

    let elector = LeaderElector::new(store.clone());
    elector.start(config("leader"), on_role_change, on_error).await.unwrap();

    assert_eq!(rx.recv().await.unwrap(), Role::Leader);
    store.force_lose_lock("leader");
    assert_eq!(rx.recv().await.unwrap(), Role::Follower);
    assert!(!elector.is_leader());

    elector.stop().await.unwrap();
}

#[tokio::test]
async fn stop_releases_and_drops_to_follower() {
    let store = Arc::new(FakeCoordinationStore::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let on_role_change: OnRoleChange = Arc::new(move |role| {
        let _ = tx.send(role);
    });
    let on_error: OnError = Arc::new(|_| {});

    let elector = LeaderElector::new(store);
    elector.start(config("leader"), on_role_change, on_error).await.unwrap();
    assert_eq!(rx.recv().await.unwrap(), Role::Leader);

    elector.stop().await.unwrap();
    assert_eq!(rx.recv().await.unwrap(), Role::Follower);
    assert!(!elector.is_leader());
}
