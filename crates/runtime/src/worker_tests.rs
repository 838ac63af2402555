// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::bus::memory::MemoryBus;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::{sleep, timeout};

/// Fails the first `fail_times` deliveries with the given error, then
/// succeeds.
struct FlakyHandler {
    calls: AtomicU32,
    fail_times: u32,
    error: fn() -> WorkerError,
    seen_deliveries: Mutex<Vec<Vec<u8>>>,
}

impl FlakyHandler {
    fn new(fail_times: u32, error: fn() -> WorkerError) -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_times,
            error,
            seen_deliveries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl Handler for FlakyHandler {
    fn role(&self) -> &'static str {
        "ingest"
    }

    fn subject(&self) -> Subject {
        Subject::ReportIngest
    }

    async fn handle(&self, payload: &[u8]) -> Result<(), WorkerError> {
        self.seen_deliveries.lock().push(payload.to_vec());
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_times {
            Err((self.error)())
        } else {
            Ok(())
        }
    }
}

async fn run_worker_until<F>(
    bus: MemoryBus,
    handler: Arc<FlakyHandler>,
    options: WorkerOptions,
    condition: F,
) where
    F: Fn(&FlakyHandler) -> bool,
{
    let worker = Arc::new(Worker::new(Arc::new(bus), Arc::clone(&handler) as Arc<dyn Handler>, options));
    let cancel = worker.cancel_token();
    let run = {
        let worker = Arc::clone(&worker);
        tokio::spawn(async move { worker.run().await })
    };

    let waited = timeout(std::time::Duration::from_secs(5), async {
        while !condition(&handler) {
            sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not reached");

    cancel.cancel();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn transient_failure_is_redelivered_until_success() {
    let bus = MemoryBus::new();
    bus.publish("report.ingest", b"m1".to_vec()).await.unwrap();
    let handler = Arc::new(FlakyHandler::new(2, || WorkerError::TransientIo("reset".into())));

    run_worker_until(bus, Arc::clone(&handler), WorkerOptions::default(), |h| {
        h.calls.load(Ordering::SeqCst) >= 3
    })
    .await;

    // Two nacks then a success; every attempt saw the same payload.
    assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
    for seen in handler.seen_deliveries.lock().iter() {
        assert_eq!(seen, b"m1");
    }
}

#[tokio::test]
async fn terminal_failure_is_acked_not_looped() {
    let bus = MemoryBus::new();
    bus.publish("report.ingest", b"m1".to_vec()).await.unwrap();
    bus.publish("report.ingest", b"m2".to_vec()).await.unwrap();
    let handler =
        Arc::new(FlakyHandler::new(1, || WorkerError::MalformedInput("bad".into())));

    run_worker_until(bus, Arc::clone(&handler), WorkerOptions::default(), |h| {
        h.calls.load(Ordering::SeqCst) >= 2
    })
    .await;

    // The malformed message is not retried; the second message still flows.
    sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn poison_message_moves_to_quarantine_subject() {
    let bus = MemoryBus::new();
    bus.publish("report.ingest", b"poison".to_vec()).await.unwrap();
    let handler =
        Arc::new(FlakyHandler::new(u32::MAX, || WorkerError::TransientIo("always".into())));

    let options = WorkerOptions { redelivery_budget: 3, ..Default::default() };
    let quarantined = {
        let bus = bus.clone();
        move |_: &FlakyHandler| !bus.published("report.ingest.quarantine").is_empty()
    };
    run_worker_until(bus.clone(), Arc::clone(&handler), options, quarantined).await;

    let side = bus.published("report.ingest.quarantine");
    assert_eq!(side, vec![b"poison".to_vec()]);
    // Delivered exactly `budget` times before quarantine.
    assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn concurrent_handlers_are_capped() {
    struct SlowHandler {
        current: AtomicU32,
        peak: AtomicU32,
        done: AtomicU32,
    }

    #[async_trait::async_trait]
    impl Handler for SlowHandler {
        fn role(&self) -> &'static str {
            "signal"
        }
        fn subject(&self) -> Subject {
            Subject::ReportSignals
        }
        async fn handle(&self, _payload: &[u8]) -> Result<(), WorkerError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            sleep(std::time::Duration::from_millis(30)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            self.done.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let bus = MemoryBus::new();
    for i in 0..8 {
        bus.publish("report.signals", vec![i]).await.unwrap();
    }
    let handler = Arc::new(SlowHandler {
        current: AtomicU32::new(0),
        peak: AtomicU32::new(0),
        done: AtomicU32::new(0),
    });

    let options = WorkerOptions { max_concurrent_tasks: 2, ..Default::default() };
    let worker = Arc::new(Worker::new(
        Arc::new(bus),
        Arc::clone(&handler) as Arc<dyn Handler>,
        options,
    ));
    let cancel = worker.cancel_token();
    let run = {
        let worker = Arc::clone(&worker);
        tokio::spawn(async move { worker.run().await })
    };

    timeout(std::time::Duration::from_secs(5), async {
        while handler.done.load(Ordering::SeqCst) < 8 {
            sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    cancel.cancel();
    run.await.unwrap().unwrap();
    assert!(handler.peak.load(Ordering::SeqCst) <= 2);
}
