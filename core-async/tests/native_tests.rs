//! Integration tests for core-async on native platforms.

#![cfg(not(target_arch = "wasm32"))]

use core_async::retry::{poll_until, PollError, Probe, RetryPolicy};
use core_async::{runtime, sync, task, time};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn test_task_spawn() {
    let handle = task::spawn(async { 42 });
    assert_eq!(handle.await.unwrap(), 42);
}

#[tokio::test(start_paused = true)]
async fn test_sleep_advances_paused_clock() {
    let start = time::Instant::now();
    time::sleep(time::millis(500)).await;
    assert_eq!(start.elapsed(), time::Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_bounds_pending_future() {
    let start = time::Instant::now();
    let result = time::timeout(time::millis(300), std::future::pending::<()>()).await;
    assert!(result.is_err());
    assert_eq!(start.elapsed(), time::Duration::from_millis(300));

    let ready = time::timeout(time::millis(300), async { 7 }).await;
    assert_eq!(ready.unwrap(), 7);
}

#[tokio::test]
async fn test_unbounded_channel_preserves_order() {
    let (tx, mut rx) = sync::mpsc::unbounded_channel();
    tx.send("first").unwrap();
    tx.send("second").unwrap();
    drop(tx);

    assert_eq!(rx.recv().await, Some("first"));
    assert_eq!(rx.recv().await, Some("second"));
    assert_eq!(rx.recv().await, None);
}

#[test]
fn test_block_on_outside_runtime() {
    let value = runtime::block_on(async { 5 }).unwrap();
    assert_eq!(value, 5);
}

#[tokio::test(start_paused = true)]
async fn test_poll_until_observes_flag_set_by_other_task() {
    let flag = Arc::new(AtomicBool::new(false));
    let setter = Arc::clone(&flag);

    task::spawn(async move {
        time::sleep(time::millis(650)).await;
        setter.store(true, Ordering::SeqCst);
    });

    let observed = Arc::clone(&flag);
    let attempts = poll_until(RetryPolicy::from_millis(200, 10), move |attempt| {
        let observed = Arc::clone(&observed);
        async move {
            if observed.load(Ordering::SeqCst) {
                Probe::Ready(attempt)
            } else {
                Probe::Pending
            }
        }
    })
    .await
    .unwrap();

    // Checks at 0, 200, 400, 600 ms miss the flag; the one at 800 ms sees it.
    assert_eq!(attempts, 5);
}

#[tokio::test(start_paused = true)]
async fn test_poll_until_never_hangs() {
    let result: Result<(), PollError> =
        poll_until(RetryPolicy::from_millis(200, 30), |_| async { Probe::Pending }).await;
    assert_eq!(result, Err(PollError::Exhausted { attempts: 30 }));
}
