// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Single-writer serialization in front of the destination stream.
//!
//! Concurrent datagram handling funnels into one bounded command channel
//! drained by a single task that owns the [`StreamSink`], so the underlying
//! connection never sees interleaved callers. A full queue exerts
//! back-pressure on the receive loop; UDP's own buffering and drop behavior
//! is the overload mode.

use crate::errors::WriteError;
use crate::event::SyslogEvent;
use crate::sink::StreamSink;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, trace};

#[derive(Debug)]
pub enum WriterCommand {
    Append(SyslogEvent),
    Shutdown,
}

/// Cheaply cloneable sender side of the writer channel.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<WriterCommand>,
}

impl WriterHandle {
    /// Queue one event for appending. Waits for a slot when the queue is
    /// full; fails only once the service has stopped.
    pub async fn append(&self, event: SyslogEvent) -> Result<(), WriteError> {
        self.tx
            .send(WriterCommand::Append(event))
            .await
            .map_err(|_| WriteError::ChannelClosed)
    }

    /// Stop the service after it has drained everything queued ahead of
    /// this command.
    pub async fn shutdown(&self) -> Result<(), WriteError> {
        self.tx
            .send(WriterCommand::Shutdown)
            .await
            .map_err(|_| WriteError::ChannelClosed)
    }
}

/// Owns the sink and drains the command channel.
pub struct WriterService<S> {
    sink: S,
    rx: mpsc::Receiver<WriterCommand>,
    append_timeout: Duration,
}

impl<S: StreamSink> WriterService<S> {
    pub fn new(sink: S, queue_capacity: usize, append_timeout: Duration) -> (Self, WriterHandle) {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let service = WriterService {
            sink,
            rx,
            append_timeout,
        };
        (service, WriterHandle { tx })
    }

    /// Main loop. Returns once a shutdown command arrives or every handle
    /// has been dropped.
    pub async fn run(mut self) {
        debug!("stream writer started");

        while let Some(command) = self.rx.recv().await {
            match command {
                WriterCommand::Append(event) => self.append(event).await,
                WriterCommand::Shutdown => {
                    debug!("stream writer shutting down");
                    break;
                }
            }
        }

        debug!("stream writer stopped");
    }

    /// One append, time-bounded. A failed or stalled destination costs this
    /// event only: the error is logged with the raw text for traceability
    /// and the loop moves on to the next command.
    async fn append(&mut self, event: SyslogEvent) {
        let fields = match event.to_record() {
            Ok(fields) => fields,
            Err(e) => {
                error!(error = %e, raw = %event.raw, "failed to serialize event, dropping");
                return;
            }
        };

        match timeout(self.append_timeout, self.sink.append(&fields)).await {
            Ok(Ok(id)) => trace!(record_id = %id, "event appended"),
            Ok(Err(e)) => {
                error!(error = %e, raw = %event.raw, "failed to append event, dropping");
            }
            Err(_) => {
                let e = WriteError::Timeout(self.append_timeout);
                error!(error = %e, raw = %event.raw, "append timed out, dropping event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use tracing_test::traced_test;

    #[derive(Clone, Default)]
    struct RecordingSink {
        records: Arc<Mutex<Vec<Vec<(String, String)>>>>,
    }

    #[async_trait]
    impl StreamSink for RecordingSink {
        async fn append(&mut self, fields: &[(String, String)]) -> Result<String, WriteError> {
            let mut records = self.records.lock().unwrap();
            records.push(fields.to_vec());
            Ok(format!("{}-0", records.len()))
        }
    }

    #[derive(Clone, Default)]
    struct FailingSink {
        attempts: Arc<AtomicU64>,
    }

    #[async_trait]
    impl StreamSink for FailingSink {
        async fn append(&mut self, _fields: &[(String, String)]) -> Result<String, WriteError> {
            self.attempts.fetch_add(1, Ordering::Relaxed);
            Err(WriteError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))))
        }
    }

    struct StalledSink;

    #[async_trait]
    impl StreamSink for StalledSink {
        async fn append(&mut self, _fields: &[(String, String)]) -> Result<String, WriteError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("never".to_string())
        }
    }

    fn event(raw: &str) -> SyslogEvent {
        SyslogEvent::unparsed(raw, Utc::now())
    }

    #[tokio::test]
    async fn test_appends_flow_through_in_order() {
        let sink = RecordingSink::default();
        let (service, handle) =
            WriterService::new(sink.clone(), 16, Duration::from_secs(5));
        let service_task = tokio::spawn(service.run());

        handle.append(event("first")).await.unwrap();
        handle.append(event("second")).await.unwrap();
        handle.shutdown().await.unwrap();
        service_task.await.unwrap();

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        let raw_of = |record: &Vec<(String, String)>| {
            record
                .iter()
                .find(|(k, _)| k == "raw")
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(raw_of(&records[0]), "first");
        assert_eq!(raw_of(&records[1]), "second");
    }

    #[tokio::test]
    #[traced_test]
    async fn test_append_failure_is_logged_and_service_keeps_running() {
        let sink = FailingSink::default();
        let attempts = sink.attempts.clone();
        let (service, handle) = WriterService::new(sink, 16, Duration::from_secs(5));
        let service_task = tokio::spawn(service.run());

        handle.append(event("doomed one")).await.unwrap();
        handle.append(event("doomed two")).await.unwrap();
        handle.shutdown().await.unwrap();
        service_task.await.unwrap();

        assert_eq!(attempts.load(Ordering::Relaxed), 2);
        assert!(logs_contain("failed to append event"));
        assert!(logs_contain("doomed one"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_stalled_destination_is_timed_out() {
        let (service, handle) =
            WriterService::new(StalledSink, 16, Duration::from_millis(20));
        let service_task = tokio::spawn(service.run());

        handle.append(event("stuck")).await.unwrap();
        handle.shutdown().await.unwrap();

        // the service must give up on the stalled append and still shut down
        tokio::time::timeout(Duration::from_secs(2), service_task)
            .await
            .expect("service hung on a stalled destination")
            .unwrap();
        assert!(logs_contain("append timed out"));
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_appends_first() {
        let sink = RecordingSink::default();
        let (service, handle) =
            WriterService::new(sink.clone(), 16, Duration::from_secs(5));

        for i in 0..5 {
            handle.append(event(&format!("queued {i}"))).await.unwrap();
        }
        handle.shutdown().await.unwrap();

        // service starts only after everything is queued
        service.run().await;
        assert_eq!(sink.records.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_append_after_service_stopped_errors() {
        let sink = RecordingSink::default();
        let (service, handle) = WriterService::new(sink, 16, Duration::from_secs(5));
        let service_task = tokio::spawn(service.run());

        handle.shutdown().await.unwrap();
        service_task.await.unwrap();

        let result = handle.append(event("late")).await;
        assert!(matches!(result, Err(WriteError::ChannelClosed)));
    }
}
