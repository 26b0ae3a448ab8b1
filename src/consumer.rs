//! Redis Stream consumer for benchmark tasks
//!
//! Pulls one task at a time through a consumer group and drives the
//! processor. There is no retry story anywhere in the pipeline: malformed
//! payloads and failed tasks are acknowledged and discarded so poison
//! messages cannot loop forever, and partial side effects are never
//! replayed by a redelivery.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use redis::aio::ConnectionManager;

use crate::config::QueueConfig;
use crate::constants::PAYLOAD_FIELD;
use crate::error::WorkerError;
use crate::models::QueueMessage;
use crate::processor::{SubmissionProcessor, TaskOutcome};

/// Queue consumer driving one task to completion at a time
pub struct TaskConsumer {
    config: QueueConfig,
    consumer_name: String,
    redis: ConnectionManager,
    processor: SubmissionProcessor,
    shutdown: Arc<AtomicBool>,
}

impl TaskConsumer {
    pub fn new(
        config: QueueConfig,
        consumer_name: String,
        redis: ConnectionManager,
        processor: SubmissionProcessor,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            consumer_name,
            redis,
            processor,
            shutdown,
        }
    }

    /// Create the consumer group on the task stream (idempotent)
    pub async fn initialize(&mut self) -> Result<()> {
        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut self.redis)
            .await;

        match result {
            Ok(_) => {
                tracing::info!(
                    "Created consumer group '{}' on stream '{}'",
                    self.config.consumer_group,
                    self.config.stream
                );
            }
            Err(e) => {
                if !e.to_string().contains("BUSYGROUP") {
                    return Err(e.into());
                }
                tracing::debug!(
                    "Consumer group '{}' already exists on '{}'",
                    self.config.consumer_group,
                    self.config.stream
                );
            }
        }

        Ok(())
    }

    /// Run the consume loop until shutdown
    pub async fn run(&mut self) -> Result<()> {
        while !self.shutdown.load(Ordering::SeqCst) {
            match self.process_next_task().await {
                Ok(_) => {}
                Err(e) => {
                    let err_msg = e.to_string();
                    tracing::error!("Error processing task: {}", err_msg);

                    // If Redis lost the consumer group, re-create it
                    if err_msg.contains("NOGROUP") {
                        tracing::warn!("Consumer group missing, re-initializing...");
                        if let Err(init_err) = self.initialize().await {
                            tracing::error!(
                                "Failed to re-initialize consumer group: {}",
                                init_err
                            );
                        }
                    }

                    // Brief pause on error to avoid a tight loop
                    tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
                }
            }
        }

        tracing::info!("Consumer loop exiting due to shutdown signal");
        Ok(())
    }

    /// Pull and handle the next task.
    /// Returns Ok(true) if a message was consumed, Ok(false) if none arrived
    /// within the block timeout.
    async fn process_next_task(&mut self) -> Result<bool> {
        let reply: redis::Value = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.consumer_name)
            .arg("COUNT")
            .arg(1)
            .arg("BLOCK")
            .arg(self.config.block_timeout_ms)
            .arg("STREAMS")
            .arg(&self.config.stream)
            .arg(">") // Only new messages
            .query_async(&mut self.redis)
            .await?;

        let Some((message_id, payload)) = parse_stream_reply(&reply) else {
            return Ok(false);
        };

        match serde_json::from_str::<QueueMessage>(&payload) {
            Ok(task) => {
                tracing::info!(
                    message_id = %message_id,
                    repo = %task.data.repository.name,
                    "received task"
                );

                match self.processor.process(task).await {
                    Ok(TaskOutcome::Completed) => {
                        tracing::info!(message_id = %message_id, "task completed");
                    }
                    Ok(TaskOutcome::Stale) => {
                        tracing::info!(message_id = %message_id, "stale task skipped");
                    }
                    Err(err) => {
                        tracing::error!(
                            message_id = %message_id,
                            code = err.code(),
                            error = %err,
                            "task failed, discarding"
                        );
                    }
                }
            }
            Err(e) => {
                let err = WorkerError::MalformedTask(e.to_string());
                tracing::warn!(
                    message_id = %message_id,
                    code = err.code(),
                    error = %err,
                    "discarding malformed task"
                );
            }
        }

        // Acknowledge on every outcome; a failed task needs a new upstream
        // event, not a redelivery.
        self.ack(&message_id).await?;
        Ok(true)
    }

    async fn ack(&mut self, message_id: &str) -> Result<()> {
        let _: i64 = redis::cmd("XACK")
            .arg(&self.config.stream)
            .arg(&self.config.consumer_group)
            .arg(message_id)
            .query_async(&mut self.redis)
            .await?;

        tracing::debug!(message_id = %message_id, "message acknowledged");
        Ok(())
    }
}

/// Extract (message id, payload) from an XREADGROUP reply.
/// Structure: [[stream_name, [[message_id, [field, value, ...]]]]]
fn parse_stream_reply(reply: &redis::Value) -> Option<(String, String)> {
    let streams = match reply {
        redis::Value::Array(streams) if !streams.is_empty() => streams,
        _ => return None,
    };

    let stream_arr = match streams.first()? {
        redis::Value::Array(arr) => arr,
        _ => return None,
    };

    let msgs_arr = match stream_arr.get(1)? {
        redis::Value::Array(arr) => arr,
        _ => return None,
    };

    let msg_arr = match msgs_arr.first()? {
        redis::Value::Array(arr) => arr,
        _ => return None,
    };

    let message_id = value_to_string(msg_arr.first()?)?;

    let fields = match msg_arr.get(1)? {
        redis::Value::Array(arr) => arr,
        _ => return None,
    };

    let mut payload = None;
    let mut iter = fields.iter();
    while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
        if value_to_string(key).as_deref() == Some(PAYLOAD_FIELD) {
            payload = value_to_string(value);
        }
    }

    Some((message_id, payload?))
}

fn value_to_string(value: &redis::Value) -> Option<String> {
    match value {
        redis::Value::BulkString(s) => Some(String::from_utf8_lossy(s).to_string()),
        redis::Value::SimpleString(s) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(s: &str) -> redis::Value {
        redis::Value::BulkString(s.as_bytes().to_vec())
    }

    fn reply_with_fields(fields: Vec<redis::Value>) -> redis::Value {
        redis::Value::Array(vec![redis::Value::Array(vec![
            bulk("proposal"),
            redis::Value::Array(vec![redis::Value::Array(vec![
                bulk("1718-0"),
                redis::Value::Array(fields),
            ])]),
        ])])
    }

    #[test]
    fn test_parse_extracts_id_and_payload() {
        let reply = reply_with_fields(vec![
            bulk("origin"),
            bulk("webhook"),
            bulk(PAYLOAD_FIELD),
            bulk(r#"{"from":"push"}"#),
        ]);

        let (id, payload) = parse_stream_reply(&reply).unwrap();
        assert_eq!(id, "1718-0");
        assert_eq!(payload, r#"{"from":"push"}"#);
    }

    #[test]
    fn test_parse_without_payload_field() {
        let reply = reply_with_fields(vec![bulk("origin"), bulk("webhook")]);
        assert!(parse_stream_reply(&reply).is_none());
    }

    #[test]
    fn test_parse_nil_reply() {
        assert!(parse_stream_reply(&redis::Value::Nil).is_none());
        assert!(parse_stream_reply(&redis::Value::Array(vec![])).is_none());
    }
}
