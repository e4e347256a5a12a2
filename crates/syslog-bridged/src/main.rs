// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;
use tokio::time::timeout;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use syslog_bridge::{
    config::Config,
    server::SyslogServer,
    sink::RedisStreamWriter,
    writer_service::WriterService,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
pub async fn main() {
    let log_level = env::var("SYSLOG_BRIDGE_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(log_level).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = Config::from_env();

    let writer = match RedisStreamWriter::new(&config.redis_url, &config.stream) {
        Ok(writer) => writer,
        Err(e) => {
            error!("Invalid Redis URL on syslog bridge startup: {e}");
            std::process::exit(1);
        }
    };

    let (service, writer_handle) =
        WriterService::new(writer, config.queue_capacity, config.append_timeout);
    let writer_task = tokio::spawn(service.run());

    let cancel_token = CancellationToken::new();
    let server = match SyslogServer::new(&config, writer_handle.clone(), cancel_token.clone()).await
    {
        Ok(server) => server,
        Err(e) => {
            error!("Error when starting syslog listener: {e}");
            std::process::exit(1);
        }
    };

    info!(
        "syslog-udp: listening on {}:{}, appending to stream '{}' at {}",
        config.host, config.port, config.stream, config.redis_url
    );

    let server_task = tokio::spawn(server.spin());

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {e}"),
    }

    // stop the listener first so nothing new enters the queue, then let the
    // writer drain what is already queued, bounded by the grace period
    cancel_token.cancel();
    if let Err(e) = server_task.await {
        error!("Syslog listener task failed: {e}");
    }

    if let Err(e) = writer_handle.shutdown().await {
        error!("Failed to signal writer shutdown: {e}");
    }
    match timeout(config.shutdown_grace, writer_task).await {
        Ok(Ok(())) => debug!("Writer drained and stopped"),
        Ok(Err(e)) => error!("Writer task failed: {e}"),
        Err(_) => error!(
            "Writer did not drain within {:?}, abandoning queued events",
            config.shutdown_grace
        ),
    }
}
