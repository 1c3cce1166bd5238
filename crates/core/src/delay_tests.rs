use super::*;

#[tokio::test(start_paused = true)]
async fn delay_returns_after_duration() {
    let cancel = CancellationToken::new();
    let start = tokio::time::Instant::now();
    delay(Duration::from_millis(100), &cancel).await;
    assert!(tokio::time::Instant::now() - start >= Duration::from_millis(100));
    assert!(!cancel.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn delay_returns_promptly_on_cancellation() {
    let cancel = CancellationToken::new();
    let child = cancel.clone();
    tokio::spawn(async move {
        child.cancel();
    });

    let start = tokio::time::Instant::now();
    delay(Duration::from_secs(60), &cancel).await;
    // Paused time still advances only as far as required to let the
    // spawned cancel task run; it must not have advanced a full minute.
    assert!(tokio::time::Instant::now() - start < Duration::from_secs(60));
}
