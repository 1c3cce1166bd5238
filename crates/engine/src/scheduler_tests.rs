use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::mpsc;

fn constant_delay(ms: u64) -> GetDelayMs {
    Arc::new(move |_attempt| ms)
}

#[tokio::test(start_paused = true)]
async fn first_probe_is_delayed_by_get_delay_ms_of_attempt_one() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let run_check: RunCheck = Arc::new(move |_kind, _cancel| {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(());
        })
    });

    let scheduler = Scheduler::new();
    let start = tokio::time::Instant::now();
    scheduler
        .start(ProbeKind::Recovery, constant_delay(100), run_check)
        .await;

    rx.recv().await.unwrap();
    assert!(tokio::time::Instant::now() - start >= Duration::from_millis(100));

    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn attempt_increments_on_every_iteration() {
    let seen = Arc::new(AtomicU32::new(0));
    let seen_clone = seen.clone();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let run_check: RunCheck = Arc::new(move |_kind, _cancel| {
        let seen = seen_clone.clone();
        let tx = tx.clone();
        Box::pin(async move {
            seen.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(());
        })
    });

    let scheduler = Scheduler::new();
    scheduler
        .start(ProbeKind::Idle, constant_delay(10), run_check)
        .await;

    for _ in 0..3 {
        rx.recv().await.unwrap();
    }
    assert_eq!(seen.load(Ordering::SeqCst), 3);

    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn restart_begins_a_fresh_attempt_one() {
    let observed: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    let observed_clone = observed.clone();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let make_run_check = |observed: Arc<Mutex<Vec<u32>>>, tx: mpsc::UnboundedSender<()>| -> RunCheck {
        Arc::new(move |_kind, _cancel| {
            let observed = observed.clone();
            let tx = tx.clone();
            Box::pin(async move {
                observed.lock().push(1);
                let _ = tx.send(());
            })
        })
    };

    let scheduler = Scheduler::new();
    scheduler
        .start(ProbeKind::Recovery, constant_delay(10), make_run_check(observed_clone.clone(), tx.clone()))
        .await;
    rx.recv().await.unwrap();

    scheduler
        .restart(ProbeKind::Idle, constant_delay(10), make_run_check(observed_clone, tx))
        .await;
    rx.recv().await.unwrap();

    assert_eq!(observed.lock().len(), 2);
    scheduler.stop().await;
}
