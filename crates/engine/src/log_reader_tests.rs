use super::*;
use breaker_coordination::fake::FakeCoordinationStore;
use tokio::sync::mpsc;

#[tokio::test]
async fn tails_existing_entries_then_follows_new_appends() {
    let store = Arc::new(FakeCoordinationStore::new());
    store.append("k", &[("a", "1")], 1000).await.unwrap();

    let cursor: Arc<Mutex<Option<LogPosition>>> = Arc::new(Mutex::new(None));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let reader = LogReader::new(store.clone());

    let cursor_for_get = cursor.clone();
    let get_last_position: GetLastPosition = Arc::new(move || cursor_for_get.lock().clone());

    let cursor_for_entries = cursor.clone();
    let on_entries: OnEntries = Arc::new(move |entries: &[LogRecord]| {
        if let Some(last) = entries.last() {
            *cursor_for_entries.lock() = Some(last.position.clone());
        }
        let _ = tx.send(entries.to_vec());
    });
    let on_error: OnError = Arc::new(|_err| {});

    reader
        .start(
            LogReaderConfig {
                key: "k".into(),
                block: Duration::from_millis(20),
                retry_backoff: Duration::from_millis(10),
            },
            get_last_position,
            on_entries,
            on_error,
        )
        .await
        .unwrap();

    let first_batch = rx.recv().await.unwrap();
    assert_eq!(first_batch.len(), 1);
    assert_eq!(first_batch[0].field("a"), Some("1"));

    store.append("k", &[("a", "2")], 1000).await.unwrap();
    let second_batch = rx.recv().await.unwrap();
    assert_eq!(second_batch.len(), 1);
    assert_eq!(second_batch[0].field("a"), Some("2"));

    reader.stop().await.unwrap();
}

#[tokio::test]
async fn stop_before_start_is_a_noop() {
    let store = Arc::new(FakeCoordinationStore::new());
    let reader = LogReader::new(store);
    reader.stop().await.unwrap();
}
