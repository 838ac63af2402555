// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message bus abstraction over NATS JetStream.
//!
//! One stream carries all pipeline subjects; each worker role consumes
//! through a durable pull consumer named after the role, so replicas of a
//! role share one cursor. Acknowledgement is explicit: the skeleton acks
//! only after the handler returns success.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use retrace_wire::Subject;

use crate::error::WorkerError;

/// Stream holding every pipeline subject.
const STREAM_NAME: &str = "RETRACE";

/// Reconnect backoff: 5 s base, doubling, 60 s cap, unbounded attempts.
const RECONNECT_BASE: Duration = Duration::from_secs(5);
const RECONNECT_CAP: Duration = Duration::from_secs(60);

/// One delivered message with its ack handle.
pub struct BusMessage {
    pub subject: String,
    pub payload: Vec<u8>,
    /// How many times the bus has delivered this message, this one included.
    pub deliveries: u64,
    acker: Box<dyn Acker>,
}

impl BusMessage {
    pub fn new(
        subject: String,
        payload: Vec<u8>,
        deliveries: u64,
        acker: Box<dyn Acker>,
    ) -> Self {
        Self { subject, payload, deliveries, acker }
    }

    /// Acknowledge; the bus will not redeliver.
    pub async fn ack(self) -> Result<(), WorkerError> {
        self.acker.ack().await
    }

    /// Negative-acknowledge; the bus redelivers after its backoff.
    pub async fn nack(self) -> Result<(), WorkerError> {
        self.acker.nack().await
    }
}

/// Ack backend for one message.
#[async_trait]
pub trait Acker: Send + Sync {
    async fn ack(&self) -> Result<(), WorkerError>;
    async fn nack(&self) -> Result<(), WorkerError>;
}

/// Active subscription handle.
#[async_trait]
pub trait Subscription: Send {
    /// Next message, or `None` once the subscription is closed.
    async fn next(&mut self) -> Option<BusMessage>;
}

/// The bus as the skeleton sees it.
#[async_trait]
pub trait Bus: Send + Sync + 'static {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), WorkerError>;

    /// Subscribe with a durable consumer group.
    async fn subscribe(
        &self,
        subject: Subject,
        group: &str,
    ) -> Result<Box<dyn Subscription>, WorkerError>;
}

/// JetStream-backed bus.
pub struct NatsBus {
    jetstream: async_nats::jetstream::Context,
}

impl NatsBus {
    /// Connect, retrying forever with exponential backoff. One log line per
    /// attempt.
    pub async fn connect(url: &str) -> Self {
        let mut delay = RECONNECT_BASE;
        let mut attempt = 1u64;
        loop {
            match async_nats::connect(url).await {
                Ok(client) => {
                    info!(url, attempt, "connected to message bus");
                    return Self { jetstream: async_nats::jetstream::new(client) };
                }
                Err(err) => {
                    warn!(url, attempt, error = %err, delay_secs = delay.as_secs(), "bus connection failed, retrying");
                    sleep(delay).await;
                    delay = (delay * 2).min(RECONNECT_CAP);
                    attempt += 1;
                }
            }
        }
    }

    /// Ensure the pipeline stream exists with all subjects bound.
    async fn ensure_stream(
        &self,
    ) -> Result<async_nats::jetstream::stream::Stream, WorkerError> {
        let subjects: Vec<String> = Subject::all()
            .iter()
            .map(|s| s.as_str().to_string())
            .chain(Subject::all().iter().map(|s| format!("{}.quarantine", s.as_str())))
            .collect();
        self.jetstream
            .get_or_create_stream(async_nats::jetstream::stream::Config {
                name: STREAM_NAME.to_string(),
                subjects,
                ..Default::default()
            })
            .await
            .map_err(|err| WorkerError::TransientIo(err.to_string()))
    }
}

#[async_trait]
impl Bus for NatsBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), WorkerError> {
        let ack = self
            .jetstream
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|err| WorkerError::TransientIo(err.to_string()))?;
        ack.await.map_err(|err| WorkerError::TransientIo(err.to_string()))?;
        Ok(())
    }

    async fn subscribe(
        &self,
        subject: Subject,
        group: &str,
    ) -> Result<Box<dyn Subscription>, WorkerError> {
        let stream = self.ensure_stream().await?;
        let consumer = stream
            .get_or_create_consumer(
                group,
                async_nats::jetstream::consumer::pull::Config {
                    durable_name: Some(group.to_string()),
                    filter_subject: subject.as_str().to_string(),
                    ack_policy: async_nats::jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
            )
            .await
            .map_err(|err| WorkerError::TransientIo(err.to_string()))?;
        let messages = consumer
            .messages()
            .await
            .map_err(|err| WorkerError::TransientIo(err.to_string()))?;
        Ok(Box::new(NatsSubscription { messages }))
    }
}

struct NatsSubscription {
    messages: async_nats::jetstream::consumer::pull::Stream,
}

#[async_trait]
impl Subscription for NatsSubscription {
    async fn next(&mut self) -> Option<BusMessage> {
        loop {
            let msg = match self.messages.next().await? {
                Ok(msg) => msg,
                Err(err) => {
                    warn!(error = %err, "bus receive error");
                    continue;
                }
            };
            let deliveries = msg.info().map(|i| i.delivered as u64).unwrap_or(1);
            let subject = msg.subject.to_string();
            let payload = msg.payload.to_vec();
            return Some(BusMessage::new(
                subject,
                payload,
                deliveries,
                Box::new(NatsAcker { message: msg }),
            ));
        }
    }
}

struct NatsAcker {
    message: async_nats::jetstream::Message,
}

#[async_trait]
impl Acker for NatsAcker {
    async fn ack(&self) -> Result<(), WorkerError> {
        self.message
            .ack()
            .await
            .map_err(|err| WorkerError::TransientIo(err.to_string()))
    }

    async fn nack(&self) -> Result<(), WorkerError> {
        self.message
            .ack_with(async_nats::jetstream::AckKind::Nak(None))
            .await
            .map_err(|err| WorkerError::TransientIo(err.to_string()))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod memory {
    //! In-memory bus with redelivery, for tests.

    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct MemoryState {
        subscribers: HashMap<String, mpsc::UnboundedSender<(Vec<u8>, u64)>>,
        /// Messages published before any subscriber existed, per subject.
        pending: HashMap<String, Vec<(Vec<u8>, u64)>>,
        published: Vec<(String, Vec<u8>)>,
    }

    /// Single-process bus: one subscriber per subject, nack redelivers to it
    /// with an incremented delivery count.
    #[derive(Clone, Default)]
    pub struct MemoryBus {
        state: Arc<Mutex<MemoryState>>,
    }

    impl MemoryBus {
        pub fn new() -> Self {
            Self::default()
        }

        /// Payloads published to a subject, for assertions.
        pub fn published(&self, subject: &str) -> Vec<Vec<u8>> {
            self.state
                .lock()
                .published
                .iter()
                .filter(|(s, _)| s == subject)
                .map(|(_, p)| p.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Bus for MemoryBus {
        async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), WorkerError> {
            let mut state = self.state.lock();
            state.published.push((subject.to_string(), payload.clone()));
            if let Some(tx) = state.subscribers.get(subject) {
                let _ = tx.send((payload, 1));
            } else {
                state.pending.entry(subject.to_string()).or_default().push((payload, 1));
            }
            Ok(())
        }

        async fn subscribe(
            &self,
            subject: Subject,
            _group: &str,
        ) -> Result<Box<dyn Subscription>, WorkerError> {
            let (tx, rx) = mpsc::unbounded_channel();
            let mut state = self.state.lock();
            // Durable-consumer shape: messages published before the
            // subscription existed are delivered once it does.
            for message in state.pending.remove(subject.as_str()).unwrap_or_default() {
                let _ = tx.send(message);
            }
            state.subscribers.insert(subject.as_str().to_string(), tx.clone());
            Ok(Box::new(MemorySubscription {
                subject: subject.as_str().to_string(),
                rx,
                redeliver: tx,
            }))
        }
    }

    struct MemorySubscription {
        subject: String,
        rx: mpsc::UnboundedReceiver<(Vec<u8>, u64)>,
        redeliver: mpsc::UnboundedSender<(Vec<u8>, u64)>,
    }

    #[async_trait]
    impl Subscription for MemorySubscription {
        async fn next(&mut self) -> Option<BusMessage> {
            let (payload, deliveries) = self.rx.recv().await?;
            Some(BusMessage::new(
                self.subject.clone(),
                payload.clone(),
                deliveries,
                Box::new(MemoryAcker {
                    payload,
                    deliveries,
                    redeliver: self.redeliver.clone(),
                }),
            ))
        }
    }

    struct MemoryAcker {
        payload: Vec<u8>,
        deliveries: u64,
        redeliver: mpsc::UnboundedSender<(Vec<u8>, u64)>,
    }

    #[async_trait]
    impl Acker for MemoryAcker {
        async fn ack(&self) -> Result<(), WorkerError> {
            Ok(())
        }

        async fn nack(&self) -> Result<(), WorkerError> {
            let _ = self.redeliver.send((self.payload.clone(), self.deliveries + 1));
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
