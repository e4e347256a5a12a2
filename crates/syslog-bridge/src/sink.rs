// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Destination stream clients.

use crate::errors::WriteError;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// An ordered, append-only destination for flat field/value records.
///
/// Implementations append exactly one record per call and return the
/// destination-assigned record id. They must not retry on failure; retry
/// policy, if any, belongs to the caller.
#[async_trait]
pub trait StreamSink: Send {
    async fn append(&mut self, fields: &[(String, String)]) -> Result<String, WriteError>;
}

/// Appends records to a Redis Stream with `XADD <stream> *`.
///
/// The connection is acquired lazily on first append so that a destination
/// that is down at startup does not prevent the bridge from starting; once
/// established, [`ConnectionManager`] reconnects between calls on its own.
/// Individual appends still fail fast and are never retried here.
pub struct RedisStreamWriter {
    client: redis::Client,
    stream: String,
    connection: Option<ConnectionManager>,
}

impl RedisStreamWriter {
    /// Validates the connection URL without any I/O.
    pub fn new(redis_url: &str, stream: &str) -> Result<Self, WriteError> {
        Ok(RedisStreamWriter {
            client: redis::Client::open(redis_url)?,
            stream: stream.to_string(),
            connection: None,
        })
    }

    async fn connection(&mut self) -> Result<&mut ConnectionManager, WriteError> {
        if self.connection.is_none() {
            self.connection = Some(self.client.get_connection_manager().await?);
        }
        #[allow(clippy::expect_used)]
        Ok(self.connection.as_mut().expect("connection populated above"))
    }
}

#[async_trait]
impl StreamSink for RedisStreamWriter {
    async fn append(&mut self, fields: &[(String, String)]) -> Result<String, WriteError> {
        let stream = self.stream.clone();
        let connection = self.connection().await?;
        let id: String = connection.xadd(&stream, "*", fields).await?;
        Ok(id)
    }
}
