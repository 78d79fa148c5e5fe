use super::{Broker, BrokerError};
use crate::app::config::BrokerSettings;
use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use redis::aio::MultiplexedConnection;

/// Redis pub/sub backend.
///
/// The multiplexed connection is cheap to clone and pipelines concurrent commands over a
/// single socket, so the five workers share it without extra locking.
#[derive(Clone)]
pub struct RedisBroker {
    connection: MultiplexedConnection,
    address: String,
}

impl RedisBroker {
    pub fn url(settings: &BrokerSettings) -> String {
        format!("redis://{}:{}/{}", settings.host, settings.port, settings.db)
    }

    pub async fn connect(settings: &BrokerSettings) -> Result<Self, BrokerError> {
        let url = Self::url(settings);
        let client = redis::Client::open(url.as_str())
            .map_err(|e| BrokerError::InvalidConfiguration(format!("{url}: {e}")))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BrokerError::Unreachable(format!("{url}: {e}")))?;

        Ok(Self {
            connection,
            address: format!("{}:{}", settings.host, settings.port),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Broker for RedisBroker {
    fn publish(&self, topic: &str, payload: Bytes) -> BoxFuture<'static, Result<(), BrokerError>> {
        let mut connection = self.connection.clone();
        let topic = topic.to_string();
        async move {
            let _receivers: i64 = redis::cmd("PUBLISH")
                .arg(&topic)
                .arg(payload.as_ref())
                .query_async(&mut connection)
                .await?;
            Ok(())
        }
        .boxed()
    }

    fn ping(&self) -> BoxFuture<'static, Result<(), BrokerError>> {
        let mut connection = self.connection.clone();
        async move {
            let _pong: String = redis::cmd("PING").query_async(&mut connection).await?;
            Ok(())
        }
        .boxed()
    }
}
