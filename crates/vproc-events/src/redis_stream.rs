//! Redis Streams event publisher.

use async_trait::async_trait;
use tracing::info;

use vproc_models::{JobId, UploadEvent};

use crate::error::EventResult;
use crate::publisher::EventPublisher;

/// Stream configuration shared by publisher and consumer.
#[derive(Debug, Clone)]
pub struct EventStreamConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for upload events
    pub stream_name: String,
}

impl Default for EventStreamConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "vproc:uploads".to_string(),
        }
    }
}

impl EventStreamConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            stream_name: std::env::var("UPLOAD_STREAM")
                .unwrap_or_else(|_| "vproc:uploads".to_string()),
        }
    }
}

/// Publisher writing upload events to a Redis Stream.
pub struct RedisEventPublisher {
    client: redis::Client,
    config: EventStreamConfig,
}

impl RedisEventPublisher {
    pub fn new(config: EventStreamConfig) -> EventResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> EventResult<Self> {
        Self::new(EventStreamConfig::from_env())
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish_upload_event(
        &self,
        job_id: JobId,
        stored_filename: &str,
    ) -> EventResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let event = UploadEvent::new(job_id, stored_filename);
        let payload = serde_json::to_string(&event)?;

        let message_id: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("*")
            .arg("event")
            .arg(&payload)
            .query_async(&mut conn)
            .await?;

        info!(
            %job_id,
            filename = stored_filename,
            message_id = %message_id,
            "upload event published"
        );
        Ok(())
    }
}
