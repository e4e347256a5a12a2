// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Environment-driven configuration.
//!
//! Every knob has a default; a variable that is unset or fails to parse
//! falls back silently. The bridge is meant to start with zero
//! configuration against a local Redis.

use std::env;
use std::time::Duration;

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";
const DEFAULT_STREAM: &str = "syslog";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5514;
const DEFAULT_QUEUE_CAPACITY: usize = 1024;
const DEFAULT_APPEND_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL.
    pub redis_url: String,
    /// Destination stream key.
    pub stream: String,
    /// Address the UDP listener binds to.
    pub host: String,
    /// Port the UDP listener binds to.
    pub port: u16,
    /// Bound on events queued between listener and writer.
    pub queue_capacity: usize,
    /// Upper bound on a single append to the destination.
    pub append_timeout: Duration,
    /// How long shutdown waits for the writer to drain.
    pub shutdown_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            stream: DEFAULT_STREAM.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            append_timeout: Duration::from_secs(DEFAULT_APPEND_TIMEOUT_SECS),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            redis_url: env::var("SYSLOG_BRIDGE_REDIS_URL")
                .unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            stream: env::var("SYSLOG_BRIDGE_STREAM")
                .unwrap_or_else(|_| DEFAULT_STREAM.to_string()),
            host: env::var("SYSLOG_BRIDGE_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("SYSLOG_BRIDGE_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            queue_capacity: env::var("SYSLOG_BRIDGE_QUEUE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_QUEUE_CAPACITY),
            append_timeout: Duration::from_secs(
                env::var("SYSLOG_BRIDGE_APPEND_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_APPEND_TIMEOUT_SECS),
            ),
            shutdown_grace: Duration::from_secs(
                env::var("SYSLOG_BRIDGE_SHUTDOWN_GRACE_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS),
            ),
        }
    }
}
