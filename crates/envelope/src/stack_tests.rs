// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::EnvelopeError;
use parking_lot::Mutex;
use std::sync::Arc;

#[tokio::test]
async fn release_runs_in_reverse_acquisition_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut stack = ReleaseStack::new();

    for name in ["container", "network", "monitor"] {
        let order = Arc::clone(&order);
        stack.push(name, move || async move {
            order.lock().push(name);
            Ok(())
        });
    }

    assert_eq!(stack.acquired(), vec!["container", "network", "monitor"]);
    let errors = stack.release_all().await;
    assert!(errors.is_empty());
    assert_eq!(*order.lock(), vec!["monitor", "network", "container"]);
}

#[tokio::test]
async fn failing_layer_does_not_block_later_releases() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut stack = ReleaseStack::new();

    {
        let order = Arc::clone(&order);
        stack.push("container", move || async move {
            order.lock().push("container");
            Ok(())
        });
    }
    stack.push("network", || async {
        Err(EnvelopeError::Policy("tc del refused".into()))
    });

    let errors = stack.release_all().await;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "network");
    // The container below the failing layer was still released.
    assert_eq!(*order.lock(), vec!["container"]);
}

#[tokio::test]
async fn empty_stack_releases_cleanly() {
    assert!(ReleaseStack::new().release_all().await.is_empty());
}
