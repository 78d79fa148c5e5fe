use super::{Broker, BrokerError};
use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast;

const SUBSCRIBER_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Bytes,
}

#[derive(Debug, Default)]
struct Inner {
    messages: Mutex<Vec<PublishedMessage>>,
    subscribers: Mutex<HashMap<String, broadcast::Sender<Bytes>>>,
    failing: AtomicBool,
    failing_topics: Mutex<HashSet<String>>,
    attempts: AtomicU64,
}

/// In-process broker that records every published message.
///
/// Can be switched into a failing mode to exercise the fallback path, and supports
/// per-topic subscriptions for local consumers.
#[derive(Debug, Clone, Default)]
pub struct MemoryBroker {
    inner: Arc<Inner>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A broker whose publishes and pings all fail.
    pub fn failing() -> Self {
        let broker = Self::new();
        broker.set_failing(true);
        broker
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail publishes on `topic` only; other topics keep working.
    pub fn fail_topic(&self, topic: &str) {
        self.inner.failing_topics.lock().insert(topic.to_string());
    }

    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<Bytes> {
        let mut subscribers = self.inner.subscribers.lock();
        subscribers
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(SUBSCRIBER_CAPACITY).0)
            .subscribe()
    }

    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.inner.messages.lock().clone()
    }

    pub fn messages_for(&self, topic: &str) -> Vec<Bytes> {
        self.inner
            .messages
            .lock()
            .iter()
            .filter(|message| message.topic == topic)
            .map(|message| message.payload.clone())
            .collect()
    }

    /// Number of publish calls, successful or not.
    pub fn attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::Relaxed)
    }

    fn publish_now(&self, topic: &str, payload: Bytes) -> Result<(), BrokerError> {
        self.inner.attempts.fetch_add(1, Ordering::Relaxed);
        if self.inner.failing.load(Ordering::SeqCst)
            || self.inner.failing_topics.lock().contains(topic)
        {
            return Err(BrokerError::PublishFailed {
                topic: topic.to_string(),
                reason: "memory broker is in failing mode".to_string(),
            });
        }

        if let Some(subscribers) = self.inner.subscribers.lock().get(topic) {
            // No live subscribers is not an error for pub/sub.
            let _ = subscribers.send(payload.clone());
        }

        self.inner.messages.lock().push(PublishedMessage {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }
}

impl Broker for MemoryBroker {
    fn publish(&self, topic: &str, payload: Bytes) -> BoxFuture<'static, Result<(), BrokerError>> {
        let result = self.publish_now(topic, payload);
        async move { result }.boxed()
    }

    fn ping(&self) -> BoxFuture<'static, Result<(), BrokerError>> {
        let result = if self.inner.failing.load(Ordering::SeqCst) {
            Err(BrokerError::Unreachable("memory broker is in failing mode".to_string()))
        } else {
            Ok(())
        };
        async move { result }.boxed()
    }
}
