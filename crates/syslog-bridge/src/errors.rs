// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Errors surfaced by the stream write path.
///
/// The writer never retries internally and never silently drops; the caller
/// decides what a failed append means (for the bridge: log and discard).
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("append timed out after {0:?}")]
    Timeout(Duration),

    #[error("writer channel closed")]
    ChannelClosed,
}

/// Errors raised while starting the UDP listener. Bind failure is the only
/// startup condition allowed to affect process lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}
