// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatch skeleton shared by all nine worker roles.

use async_trait::async_trait;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use retrace_wire::{quarantine_subject, Subject};

use crate::bus::{Bus, BusMessage};
use crate::error::{Disposition, WorkerError};

/// One worker role's message handler.
///
/// Invocations run concurrently up to the worker's admission cap and must not
/// share mutable state; everything shared lives behind the context the
/// handler was constructed with.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Role name; doubles as the durable consumer group.
    fn role(&self) -> &'static str;

    /// Subject this role consumes.
    fn subject(&self) -> Subject;

    /// Process one message. Must be idempotent under redelivery.
    async fn handle(&self, payload: &[u8]) -> Result<(), WorkerError>;
}

/// Dispatch knobs, taken from [`crate::WorkerConfig`] by the binary.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub max_concurrent_tasks: usize,
    pub redelivery_budget: u64,
    pub drain_timeout: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 5,
            redelivery_budget: 5,
            drain_timeout: Duration::from_secs(30),
        }
    }
}

/// The skeleton: subscribe, admit, dispatch, ack.
pub struct Worker<B: Bus> {
    bus: Arc<B>,
    handler: Arc<dyn Handler>,
    options: WorkerOptions,
    admission: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl<B: Bus> Worker<B> {
    pub fn new(bus: Arc<B>, handler: Arc<dyn Handler>, options: WorkerOptions) -> Self {
        let admission = Arc::new(Semaphore::new(options.max_concurrent_tasks));
        Self { bus, handler, options, admission, cancel: CancellationToken::new() }
    }

    /// Token that stops the dispatch loop when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Subscribe and dispatch until cancelled, then drain.
    ///
    /// At-least-once contract: a message is acked only after its handler
    /// returned success or a terminal failure; handler errors and panics
    /// become nacks so the bus redelivers.
    pub async fn run(&self) -> Result<(), WorkerError> {
        let role = self.handler.role();
        let subject = self.handler.subject();
        let mut subscription = self.bus.subscribe(subject, role).await?;
        info!(role, subject = %subject, "worker ready, waiting for messages");

        loop {
            let message = tokio::select! {
                () = self.cancel.cancelled() => break,
                msg = subscription.next() => match msg {
                    Some(msg) => msg,
                    None => {
                        warn!(role, "subscription closed");
                        break;
                    }
                },
            };

            if message.deliveries > self.options.redelivery_budget {
                self.quarantine(subject, message).await;
                continue;
            }

            let permit = tokio::select! {
                () = self.cancel.cancelled() => break,
                permit = Arc::clone(&self.admission).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let handler = Arc::clone(&self.handler);
            tokio::spawn(async move {
                let _permit = permit;
                dispatch_one(handler, message).await;
            });
        }

        self.drain().await;
        Ok(())
    }

    /// Move a message past its redelivery budget to the side subject. This is
    /// the one [`Disposition::Quarantine`] path; handlers never return it.
    async fn quarantine(&self, subject: Subject, message: BusMessage) {
        error!(
            role = self.handler.role(),
            subject = %subject,
            deliveries = message.deliveries,
            "quarantining poison message"
        );

        let side = quarantine_subject(subject);
        if let Err(publish_err) = self.bus.publish(&side, message.payload.clone()).await {
            // Leave it unacked; the bus will redeliver and we try again.
            warn!(error = %publish_err, "quarantine publish failed");
            let _ = message.nack().await;
            return;
        }
        let _ = message.ack().await;
    }

    /// Wait for in-flight handlers up to the grace period. Handlers that
    /// exceed it keep running detached; their messages stay unacked and the
    /// bus redelivers them.
    async fn drain(&self) {
        let all = self.options.max_concurrent_tasks as u32;
        let drained = tokio::time::timeout(
            self.options.drain_timeout,
            self.admission.acquire_many(all),
        )
        .await;
        match drained {
            Ok(_) => info!(role = self.handler.role(), "drained in-flight handlers"),
            Err(_) => warn!(
                role = self.handler.role(),
                grace_secs = self.options.drain_timeout.as_secs(),
                "drain grace period exceeded, leaving messages for redelivery"
            ),
        }
    }
}

/// Run one handler invocation and translate the outcome into ack/nack.
async fn dispatch_one(handler: Arc<dyn Handler>, message: BusMessage) {
    let role = handler.role();
    let subject = message.subject.clone();
    let deliveries = message.deliveries;

    let outcome = AssertUnwindSafe(handler.handle(&message.payload))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => {
            if let Err(err) = message.ack().await {
                warn!(role, subject, error = %err, "ack failed");
            }
        }
        Ok(Err(handler_err)) => match handler_err.disposition() {
            Disposition::Retry | Disposition::Quarantine => {
                warn!(role, subject, deliveries, error = %handler_err, "handler failed, message will be redelivered");
                if let Err(err) = message.nack().await {
                    warn!(role, subject, error = %err, "nack failed");
                }
            }
            Disposition::Ack => {
                error!(role, subject, error = %handler_err, "terminal handler failure, acking to prevent loops");
                if let Err(err) = message.ack().await {
                    warn!(role, subject, error = %err, "ack failed");
                }
            }
        },
        Err(_panic) => {
            error!(role, subject, deliveries, "handler panicked, message will be redelivered");
            let _ = message.nack().await;
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
