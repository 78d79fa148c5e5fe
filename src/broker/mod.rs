//! Publish/subscribe backends the publisher workers forward payloads to.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::{MemoryBroker, PublishedMessage};
#[cfg(feature = "redis")]
pub use self::redis::RedisBroker;

use crate::app::Config;
use bytes::Bytes;
use futures::future::BoxFuture;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[cfg(test)]
use mockall::automock;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Broker unreachable: {0}")]
    Unreachable(String),
    #[error("Publish to '{topic}' failed: {reason}")]
    PublishFailed { topic: String, reason: String },
    #[error("Invalid broker configuration: {0}")]
    InvalidConfiguration(String),
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

/// Client side of the pub/sub backend.
///
/// One instance is shared by all five publisher workers, so implementations must be safe
/// for concurrent use without external locking. Returned futures own everything they need.
#[cfg_attr(test, automock)]
pub trait Broker: Send + Sync {
    fn publish(&self, topic: &str, payload: Bytes) -> BoxFuture<'static, Result<(), BrokerError>>;

    /// Cheap round trip used to decide at startup whether pub/sub is usable.
    fn ping(&self) -> BoxFuture<'static, Result<(), BrokerError>>;
}

/// Keep `broker` only if it answers a ping; otherwise the pipeline runs file-only.
pub async fn ensure_available(broker: Arc<dyn Broker>) -> Option<Arc<dyn Broker>> {
    match broker.ping().await {
        Ok(()) => Some(broker),
        Err(e) => {
            error!("Broker ping failed, falling back to file logging: {}", e);
            None
        }
    }
}

/// Build the process-wide broker handle from configuration.
///
/// Returns `None` when pub/sub is disabled or the broker cannot be reached; both cases
/// mean every event is written to the fallback file.
pub async fn connect_broker(config: &Config) -> Option<Arc<dyn Broker>> {
    if !config.pubsub_enabled {
        info!("Pub/sub disabled, events will be written to the fallback file only");
        return None;
    }

    #[cfg(feature = "redis")]
    {
        match RedisBroker::connect(&config.broker).await {
            Ok(broker) => {
                info!("Connected to redis at {}", broker.address());
                ensure_available(Arc::new(broker)).await
            }
            Err(e) => {
                error!("Failed to initialize redis, falling back to file logging: {}", e);
                None
            }
        }
    }

    #[cfg(not(feature = "redis"))]
    {
        tracing::warn!(
            "Pub/sub enabled for {}:{} but no broker backend was compiled in; using file-only mode",
            config.broker.host, config.broker.port
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[tokio::test]
    async fn reachable_broker_is_kept() {
        let mut mock = MockBroker::new();
        mock.expect_ping()
            .times(1)
            .returning(|| async { Ok(()) }.boxed());

        assert!(ensure_available(Arc::new(mock)).await.is_some());
    }

    #[tokio::test]
    async fn unreachable_broker_is_discarded() {
        let mut mock = MockBroker::new();
        mock.expect_ping().times(1).returning(|| {
            async { Err(BrokerError::Unreachable("connection refused".to_string())) }.boxed()
        });

        assert!(ensure_available(Arc::new(mock)).await.is_none());
    }

    #[cfg(feature = "redis")]
    #[tokio::test]
    async fn unreachable_redis_yields_file_only_mode() {
        let mut config = Config {
            pubsub_enabled: true,
            redis_port: 1,
            ..Config::default()
        };
        config.post_process().unwrap();

        assert!(connect_broker(&config).await.is_none());
    }

    #[tokio::test]
    async fn disabled_pubsub_yields_no_broker() {
        let config = Config {
            pubsub_enabled: false,
            ..Config::default()
        };
        assert!(connect_broker(&config).await.is_none());
    }
}
