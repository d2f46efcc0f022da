//! Redis Streams integration tests.
//!
//! These tests require a reachable Redis instance.
//! Run with: `cargo test -p vproc-events -- --ignored`

use std::time::Duration;

use vproc_events::{
    ConsumerConfig, EventPublisher, EventStreamConfig, RedisEventPublisher, UploadEventStream,
};
use vproc_models::JobId;

#[tokio::test]
#[ignore = "requires Redis"]
async fn publish_and_consume_round_trip() {
    dotenvy::dotenv().ok();

    let stream_name = "vproc:test:uploads".to_string();
    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

    let consumer = UploadEventStream::new(ConsumerConfig {
        redis_url: redis_url.clone(),
        stream_name: stream_name.clone(),
        consumer_group: "vproc:test:workers".to_string(),
        consumer_name: "test-consumer".to_string(),
        block_timeout: Duration::from_secs(2),
    })
    .expect("failed to create consumer");

    // Group must exist before the publish so "$" does not skip the message.
    consumer.init().await.expect("failed to init stream");

    let publisher = RedisEventPublisher::new(EventStreamConfig {
        redis_url,
        stream_name,
    })
    .expect("failed to create publisher");

    publisher
        .publish_upload_event(JobId::new(100), "20260807_120000_1_clip.mp4")
        .await
        .expect("failed to publish");

    let (message_id, event) = consumer
        .read_next()
        .await
        .expect("failed to read")
        .expect("no event within timeout");

    assert_eq!(event.job_id, JobId::new(100));
    assert_eq!(event.filename, "20260807_120000_1_clip.mp4");

    consumer.ack(&message_id).await.expect("failed to ack");
}
