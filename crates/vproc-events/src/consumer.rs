//! Consumer-group reader for the upload event stream.

use std::time::Duration;

use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use tracing::{debug, info};

use vproc_models::UploadEvent;

use crate::error::{EventError, EventResult};

/// Consumer configuration.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for upload events
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// Name of this consumer within the group
    pub consumer_name: String,
    /// How long one read blocks waiting for a message
    pub block_timeout: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "vproc:uploads".to_string(),
            consumer_group: "vproc:workers".to_string(),
            consumer_name: "worker-1".to_string(),
            block_timeout: Duration::from_secs(5),
        }
    }
}

impl ConsumerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            stream_name: std::env::var("UPLOAD_STREAM")
                .unwrap_or_else(|_| "vproc:uploads".to_string()),
            consumer_group: std::env::var("UPLOAD_CONSUMER_GROUP")
                .unwrap_or_else(|_| "vproc:workers".to_string()),
            consumer_name: std::env::var("UPLOAD_CONSUMER_NAME")
                .unwrap_or_else(|_| "worker-1".to_string()),
            block_timeout: Duration::from_secs(
                std::env::var("UPLOAD_BLOCK_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

/// Upload event reader for the out-of-process worker.
pub struct UploadEventStream {
    client: redis::Client,
    config: ConsumerConfig,
}

impl UploadEventStream {
    pub fn new(config: ConsumerConfig) -> EventResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> EventResult<Self> {
        Self::new(ConsumerConfig::from_env())
    }

    /// Initialize the stream (create the consumer group if not exists).
    pub async fn init(&self) -> EventResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("created consumer group: {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(
                    "consumer group already exists: {}",
                    self.config.consumer_group
                );
            }
            Err(e) => return Err(EventError::Redis(e)),
        }

        Ok(())
    }

    /// Read the next upload event, blocking up to the configured timeout.
    ///
    /// Returns `None` when the timeout elapses without a message. The
    /// returned message id must be passed to [`ack`](Self::ack) once the
    /// job has been executed.
    pub async fn read_next(&self) -> EventResult<Option<(String, UploadEvent)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let options = StreamReadOptions::default()
            .group(&self.config.consumer_group, &self.config.consumer_name)
            .count(1)
            .block(self.config.block_timeout.as_millis() as usize);

        let reply: StreamReadReply = conn
            .xread_options(&[&self.config.stream_name], &[">"], &options)
            .await?;

        for key in reply.keys {
            for message in key.ids {
                let payload: String = message.get("event").ok_or_else(|| {
                    EventError::ConsumeFailed(format!(
                        "message {} carries no event field",
                        message.id
                    ))
                })?;
                let event: UploadEvent = serde_json::from_str(&payload)?;
                return Ok(Some((message.id, event)));
            }
        }

        Ok(None)
    }

    /// Acknowledge a consumed event and drop it from the stream.
    pub async fn ack(&self, message_id: &str) -> EventResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(&self.config.stream_name)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        debug!("acknowledged upload event: {}", message_id);
        Ok(())
    }
}
