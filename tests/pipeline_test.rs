use log_fanout::broker::MemoryBroker;
use log_fanout::sender::WorkerState;
use log_fanout::{
    EventLogger, LogEvent, LogPipeline, PipelineConfig, PipelineError, QueueKind,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn read_events(path: &std::path::Path) -> Vec<LogEvent> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| LogEvent::from_payload(line.as_bytes()).unwrap())
        .collect()
}

#[tokio::test]
async fn test_file_only_mode_writes_two_lines_per_event() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("fallback.log");
    let pipeline =
        LogPipeline::start(PipelineConfig::default().with_fallback_path(&path), None).unwrap();

    let handle = pipeline.handle();
    for i in 0..10 {
        handle.log_info("Main", &format!("INFO {i}"));
    }

    let report = pipeline.shutdown(Duration::from_secs(5)).await.unwrap();
    assert_eq!(report.stats.total_fallback(), 20);

    let events = read_events(&path);
    assert_eq!(events.len(), 20);
    assert!(events.iter().all(|event| event.level().as_str() == "INFO"));
    assert!(events.iter().all(|event| event.service() == "Main"));

    // Both workers append to the same file; each keeps its own arrival order.
    let info = report.stats.worker(QueueKind::Info).unwrap();
    let all = report.stats.worker(QueueKind::All).unwrap();
    assert_eq!(info.stats.fallback_written, 10);
    assert_eq!(all.stats.fallback_written, 10);

    let messages: Vec<_> = events.iter().map(|event| event.message()).collect();
    let mut first_seen = Vec::new();
    for message in messages {
        if !first_seen.contains(&message) {
            first_seen.push(message);
        }
    }
    let expected: Vec<String> = (0..10).map(|i| format!("INFO {i}")).collect();
    assert_eq!(first_seen, expected);
}

#[tokio::test]
async fn test_failing_broker_loses_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("fallback.log");
    let broker = MemoryBroker::failing();
    let pipeline = LogPipeline::start(
        PipelineConfig::default().with_fallback_path(&path),
        Some(Arc::new(broker.clone())),
    )
    .unwrap();

    let handle = pipeline.handle();
    for i in 0..25 {
        handle.log_error("Billing", &format!("ERROR {i}"));
    }

    let report = pipeline.shutdown(Duration::from_secs(5)).await.unwrap();
    let error = report.stats.worker(QueueKind::Error).unwrap();
    assert_eq!(error.stats.publish_failures, 25);
    assert_eq!(error.stats.fallback_written, 25);
    assert_eq!(report.stats.total_published(), 0);
    assert_eq!(broker.attempts(), 50);
    assert_eq!(read_events(&path).len(), 50);
}

#[tokio::test]
async fn test_fallback_keeps_arrival_order_of_failing_topic() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("fallback.log");
    let broker = MemoryBroker::new();
    broker.fail_topic("log-error");
    let pipeline = LogPipeline::start(
        PipelineConfig::default().with_fallback_path(&path),
        Some(Arc::new(broker.clone())),
    )
    .unwrap();

    let handle = pipeline.handle();
    for i in 0..25 {
        handle.log_error("Billing", &format!("ERROR {i}"));
    }

    let report = pipeline.shutdown(Duration::from_secs(5)).await.unwrap();
    assert_eq!(report.stats.worker(QueueKind::All).unwrap().stats.published, 25);
    assert_eq!(broker.messages_for("logs").len(), 25);

    // Only the error queue fell back, so the file holds exactly its stream.
    let messages: Vec<_> = read_events(&path)
        .into_iter()
        .map(|event| event.message().to_string())
        .collect();
    let expected: Vec<_> = (0..25).map(|i| format!("ERROR {i}")).collect();
    assert_eq!(messages, expected);
}

#[tokio::test]
async fn test_healthy_broker_skips_fallback_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("fallback.log");
    let broker = MemoryBroker::new();
    let mut info_subscriber = broker.subscribe("log-info");

    let pipeline = LogPipeline::start(
        PipelineConfig::default().with_fallback_path(&path),
        Some(Arc::new(broker.clone())),
    )
    .unwrap();
    let logger: Arc<dyn EventLogger> = Arc::new(pipeline.handle());

    for i in 0..5 {
        logger.log_info("Main", &format!("INFO {i}"));
    }

    for i in 0..5 {
        let payload = info_subscriber.recv().await.unwrap();
        let event = LogEvent::from_payload(&payload).unwrap();
        assert_eq!(event.message(), format!("INFO {i}"));
    }

    let report = pipeline.shutdown(Duration::from_secs(5)).await.unwrap();
    assert_eq!(report.stats.total_published(), 10);
    assert_eq!(broker.messages_for("logs").len(), 5);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_shutdown_drains_every_buffered_event_once() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("fallback.log");
    let broker = MemoryBroker::new();
    let pipeline = LogPipeline::start(
        PipelineConfig::default().with_fallback_path(&path),
        Some(Arc::new(broker.clone())),
    )
    .unwrap();

    let mut producers = Vec::new();
    for producer in 0..4 {
        let handle = pipeline.handle();
        producers.push(tokio::spawn(async move {
            for i in 0..100 {
                handle.log_warning("Producer", &format!("{producer}-{i}"));
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }

    let report = pipeline.shutdown(Duration::from_secs(5)).await.unwrap();
    let warning = report.stats.worker(QueueKind::Warning).unwrap();
    assert_eq!(warning.stats.published, 400);
    assert_eq!(warning.stats.state, WorkerState::Terminated);
    assert_eq!(broker.messages_for("log-warn").len(), 400);
    assert_eq!(broker.messages_for("logs").len(), 400);
    assert!(report.stats.queues.iter().all(|queue| queue.len == 0));
}

#[tokio::test]
async fn test_producer_per_queue_order_is_kept() {
    let temp_dir = TempDir::new().unwrap();
    let broker = MemoryBroker::new();
    let pipeline = LogPipeline::start(
        PipelineConfig::default().with_fallback_path(temp_dir.path().join("fallback.log")),
        Some(Arc::new(broker.clone())),
    )
    .unwrap();

    let handle = pipeline.handle();
    for i in 0..50 {
        handle.log_message("Main", &format!("custom {i}"), "DEBUG");
    }
    pipeline.shutdown(Duration::from_secs(5)).await.unwrap();

    let messages: Vec<_> = broker
        .messages_for("log-custom")
        .iter()
        .map(|payload| LogEvent::from_payload(payload).unwrap().message().to_string())
        .collect();
    let expected: Vec<_> = (0..50).map(|i| format!("custom {i}")).collect();
    assert_eq!(messages, expected);
}

#[tokio::test]
async fn test_custom_topics_are_used() {
    let temp_dir = TempDir::new().unwrap();
    let broker = MemoryBroker::new();
    let mut config =
        PipelineConfig::default().with_fallback_path(temp_dir.path().join("fallback.log"));
    config.topics.error = "alerts".to_string();

    let pipeline = LogPipeline::start(config, Some(Arc::new(broker.clone()))).unwrap();
    pipeline.handle().log_error("Main", "boom");
    pipeline.shutdown(Duration::from_secs(5)).await.unwrap();

    assert_eq!(broker.messages_for("alerts").len(), 1);
    assert!(broker.messages_for("log-error").is_empty());
}

#[tokio::test]
async fn test_shutdown_times_out_when_workers_are_stuck() {
    use futures::future::{BoxFuture, FutureExt};
    use log_fanout::{Broker, BrokerError};

    struct StalledBroker;

    impl Broker for StalledBroker {
        fn publish(&self, _topic: &str, _payload: bytes::Bytes) -> BoxFuture<'static, Result<(), BrokerError>> {
            futures::future::pending().boxed()
        }

        fn ping(&self) -> BoxFuture<'static, Result<(), BrokerError>> {
            async { Ok(()) }.boxed()
        }
    }

    let temp_dir = TempDir::new().unwrap();
    let pipeline = LogPipeline::start(
        PipelineConfig::default().with_fallback_path(temp_dir.path().join("fallback.log")),
        Some(Arc::new(StalledBroker)),
    )
    .unwrap();
    pipeline.handle().log_info("Main", "never delivered");

    let err = pipeline
        .shutdown(Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::ShutdownTimeout { timeout_ms: 100 }));
}
