use super::*;
use std::time::Duration;

#[test]
fn system_clock_epoch_ms_is_nonzero() {
    let clock = SystemClock;
    assert!(clock.epoch_ms() > 0);
}

#[test]
fn fake_clock_advance_moves_both_now_and_epoch() {
    let clock = FakeClock::new();
    let before_now = clock.now();
    let before_epoch = clock.epoch_ms();

    clock.advance(Duration::from_millis(250));

    assert_eq!(clock.now() - before_now, Duration::from_millis(250));
    assert_eq!(clock.epoch_ms() - before_epoch, 250);
}

#[test]
fn fake_clock_set_epoch_ms_is_exact() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(42);
    assert_eq!(clock.epoch_ms(), 42);
}

#[test]
fn fake_clock_clones_share_state() {
    let clock = FakeClock::new();
    let handle = clock.clone();
    clock.advance(Duration::from_millis(10));
    assert_eq!(clock.epoch_ms(), handle.epoch_ms());
}
