// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! At-least-once dispatch over the in-memory bus: redelivery converges when
//! the handler writes through natural keys.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use retrace_runtime::{Bus, Handler, MemoryBus, Worker, WorkerError, WorkerOptions};
use retrace_wire::{decode, encode, ReportRequest, Subject};

/// Fails the first delivery, then records the report id into a set; replay
/// of the same id is absorbed exactly like a keyed upsert.
struct KeyedIngest {
    attempts: AtomicU32,
    rows: Mutex<BTreeSet<String>>,
}

#[async_trait]
impl Handler for KeyedIngest {
    fn role(&self) -> &'static str {
        "ingest"
    }

    fn subject(&self) -> Subject {
        Subject::ReportIngest
    }

    async fn handle(&self, payload: &[u8]) -> Result<(), WorkerError> {
        let request: ReportRequest = decode(payload)?;
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt == 0 {
            return Err(WorkerError::TransientIo("first delivery drops".into()));
        }
        self.rows.lock().insert(request.report_id.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn redelivered_message_converges_to_one_row() {
    let bus = MemoryBus::new();
    let request = ReportRequest { report_id: "r-1".into() };
    bus.publish("report.ingest", encode(&request).unwrap()).await.unwrap();
    bus.publish("report.ingest", encode(&request).unwrap()).await.unwrap();

    let handler = Arc::new(KeyedIngest {
        attempts: AtomicU32::new(0),
        rows: Mutex::new(BTreeSet::new()),
    });
    let worker = Arc::new(Worker::new(
        Arc::new(bus),
        Arc::clone(&handler) as Arc<dyn Handler>,
        WorkerOptions::default(),
    ));
    let cancel = worker.cancel_token();
    let run = {
        let worker = Arc::clone(&worker);
        tokio::spawn(async move { worker.run().await })
    };

    tokio::time::timeout(Duration::from_secs(5), async {
        // First delivery nacked, both messages eventually processed.
        while handler.attempts.load(Ordering::SeqCst) < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    cancel.cancel();
    run.await.unwrap().unwrap();

    // Three deliveries, one row: at-least-once absorbed by the natural key.
    assert_eq!(handler.rows.lock().len(), 1);
    assert!(handler.rows.lock().contains("r-1"));
}
