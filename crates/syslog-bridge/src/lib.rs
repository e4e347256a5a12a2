// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! UDP syslog listener that bridges messages into a Redis Stream.
//!
//! Datagrams are parsed into structured events ([`event::SyslogEvent`]) and
//! forwarded over a bounded channel to a single writer task
//! ([`writer_service::WriterService`]) that owns the stream connection and
//! appends one record per event. UDP is lossy by contract, so append failures
//! are logged and dropped rather than retried or propagated.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod errors;
pub mod event;
pub mod parser;
pub mod server;
pub mod sink;
pub mod timestamp;
pub mod writer_service;
