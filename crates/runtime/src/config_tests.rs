// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn defaults_apply_without_env() {
    std::env::remove_var("DB_PORT");
    std::env::remove_var("MAX_CONCURRENT_TASKS");
    let config = WorkerConfig::load();
    assert_eq!(config.db.port, 5432);
    assert_eq!(config.db.name, "bug_repro");
    assert_eq!(config.nats_url, "nats://localhost:4222");
    assert_eq!(config.max_concurrent_tasks, 5);
    assert_eq!(config.redelivery_budget, 5);
    assert_eq!(config.drain_timeout, Duration::from_secs(30));
}

#[test]
#[serial]
fn env_overrides_and_bad_numbers_fall_back() {
    std::env::set_var("DB_PORT", "6543");
    std::env::set_var("MAX_CONCURRENT_TASKS", "not-a-number");
    let config = WorkerConfig::load();
    assert_eq!(config.db.port, 6543);
    assert_eq!(config.max_concurrent_tasks, 5);
    std::env::remove_var("DB_PORT");
    std::env::remove_var("MAX_CONCURRENT_TASKS");
}

#[test]
#[serial]
fn empty_s3_endpoint_reads_as_unset() {
    std::env::set_var("S3_ENDPOINT", "");
    let config = WorkerConfig::load();
    assert_eq!(config.object.endpoint, None);
    std::env::remove_var("S3_ENDPOINT");
}
