// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use parking_lot::Mutex;

struct FixedSampler(ResourceSample);

#[async_trait]
impl Sampler for FixedSampler {
    async fn sample(&self) -> Option<ResourceSample> {
        Some(self.0.clone())
    }
}

#[derive(Default)]
struct RecordingLog {
    records: Mutex<Vec<(String, ResourceSample)>>,
}

#[async_trait]
impl ResourceLog for RecordingLog {
    async fn record(&self, test_id: &str, sample: &ResourceSample) {
        self.records.lock().push((test_id.to_string(), sample.clone()));
    }
}

fn sample() -> ResourceSample {
    ResourceSample {
        cpu_percent: 12.0,
        memory_percent: 40.0,
        memory_used_mb: 512.0,
        disk_percent: 10.0,
        timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn monitor_records_until_cancelled() {
    let log = Arc::new(RecordingLog::default());
    let cancel = spawn_monitor(
        "t-1".to_string(),
        Duration::from_millis(10),
        Arc::new(FixedSampler(sample())),
        Arc::clone(&log) as Arc<dyn ResourceLog>,
    );

    tokio::time::sleep(Duration::from_millis(60)).await;
    cancel.cancel();
    let recorded = log.records.lock().len();
    assert!(recorded >= 2, "expected multiple samples, got {recorded}");

    tokio::time::sleep(Duration::from_millis(40)).await;
    let after_cancel = log.records.lock().len();
    // At most one in-flight sample lands after cancellation.
    assert!(after_cancel <= recorded + 1);
    assert_eq!(log.records.lock()[0].0, "t-1");
}

#[test]
fn meminfo_parsing_reads_kb_fields() {
    let meminfo = "MemTotal:       16384000 kB\nMemAvailable:    8192000 kB\n";
    assert_eq!(read_meminfo_field(meminfo, "MemTotal:"), Some(16_384_000));
    assert_eq!(read_meminfo_field(meminfo, "MemAvailable:"), Some(8_192_000));
    assert_eq!(read_meminfo_field(meminfo, "SwapTotal:"), None);
}
