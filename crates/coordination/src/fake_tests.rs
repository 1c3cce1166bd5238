use super::*;

#[tokio::test]
async fn append_trims_to_maxlen_hint() {
    let store = FakeCoordinationStore::new();
    for i in 0..5 {
        store
            .append("k", &[("n", &i.to_string())], 3)
            .await
            .unwrap();
    }

    let records = store.read_range("k", None, 100).await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].field("n"), Some("2"));
    assert_eq!(records[2].field("n"), Some("4"));
}

#[tokio::test]
async fn positions_strictly_increase_within_a_key() {
    let store = FakeCoordinationStore::new();
    let mut last = None;
    for i in 0..10 {
        let pos = store
            .append("k", &[("n", &i.to_string())], 1000)
            .await
            .unwrap();
        if let Some(last) = last {
            assert!(pos > last);
        }
        last = Some(pos);
    }
}

#[tokio::test]
async fn independent_keys_do_not_interfere() {
    let store = FakeCoordinationStore::new();
    store.append("a", &[("x", "1")], 1000).await.unwrap();
    store.append("b", &[("x", "2")], 1000).await.unwrap();

    assert_eq!(store.read_range("a", None, 100).await.unwrap().len(), 1);
    assert_eq!(store.read_range("b", None, 100).await.unwrap().len(), 1);
}

#[tokio::test]
async fn tail_with_no_new_entries_returns_empty_after_block() {
    let store = FakeCoordinationStore::new();
    let pos = store.append("k", &[("x", "1")], 1000).await.unwrap();

    let tailed = store
        .tail("k", Some(&pos), Duration::from_millis(5))
        .await
        .unwrap();
    assert!(tailed.is_empty());
}
