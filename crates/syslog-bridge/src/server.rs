// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! UDP syslog listener.
//!
//! Receives datagrams, stamps each with its receipt instant, parses it, and
//! queues the resulting event on the writer channel. One datagram is one
//! message; there is no framing across datagrams.

use std::net::SocketAddr;

use crate::config::Config;
use crate::errors::ServerError;
use crate::parser;
use crate::writer_service::WriterHandle;
use chrono::Utc;
use tracing::{debug, error, trace};

// Matches the receive buffer the Go agent defaults to for datagram sources.
const BUFFER_SIZE: usize = 8192;

// BufferReader abstracts the transport so tests can replay a fixed datagram.
enum BufferReader {
    UdpSocket(tokio::net::UdpSocket),

    /// Mirror reader for testing - replays a fixed buffer
    #[allow(dead_code)]
    MirrorTest(Vec<u8>, SocketAddr),
}

impl BufferReader {
    async fn read(&self) -> std::io::Result<(Vec<u8>, SocketAddr)> {
        match self {
            BufferReader::UdpSocket(socket) => {
                let mut buf = [0; BUFFER_SIZE];
                let (amt, src) = socket.recv_from(&mut buf).await?;
                Ok((buf[..amt].to_owned(), src))
            }
            BufferReader::MirrorTest(data, src) => Ok((data.clone(), *src)),
        }
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        match self {
            BufferReader::UdpSocket(socket) => socket.local_addr(),
            BufferReader::MirrorTest(_, src) => Ok(*src),
        }
    }
}

/// Syslog server to receive, parse, and enqueue events.
pub struct SyslogServer {
    cancel_token: tokio_util::sync::CancellationToken,
    writer_handle: WriterHandle,
    buffer_reader: BufferReader,
}

impl SyslogServer {
    /// Binds the UDP socket. Bind failure is the only fallible step of
    /// server construction and is returned to the caller, which treats it
    /// as fatal at startup.
    pub async fn new(
        config: &Config,
        writer_handle: WriterHandle,
        cancel_token: tokio_util::sync::CancellationToken,
    ) -> Result<SyslogServer, ServerError> {
        let address = format!("{}:{}", config.host, config.port);
        let socket = tokio::net::UdpSocket::bind(&address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;

        Ok(SyslogServer {
            cancel_token,
            writer_handle,
            buffer_reader: BufferReader::UdpSocket(socket),
        })
    }

    /// The address the listener actually bound, useful when the configured
    /// port is 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.buffer_reader.local_addr()
    }

    /// Main event loop. Runs until cancelled; no datagram already received
    /// is abandoned mid-processing.
    pub async fn spin(self) {
        loop {
            tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => {
                    debug!("syslog listener stopping");
                    break;
                }
                result = self.buffer_reader.read() => match result {
                    Ok((buf, src)) => self.consume_datagram(&buf, src).await,
                    Err(e) => {
                        // transient socket errors must not kill the listener
                        error!(error = %e, "failed to receive datagram");
                    }
                },
            }
        }
    }

    /// Decode, parse, and enqueue one datagram.
    async fn consume_datagram(&self, buf: &[u8], src: SocketAddr) {
        let received_at = Utc::now();
        let text = String::from_utf8_lossy(buf);
        let line = text.trim();
        if line.is_empty() {
            return;
        }
        trace!(source = %src, "received datagram: {}", line);

        let event = parser::parse(line, received_at);
        if let Err(e) = self.writer_handle.append(event).await {
            error!(error = %e, "failed to enqueue event");
        }
    }
}
