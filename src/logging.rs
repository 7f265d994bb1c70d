// ABOUTME: Logging configuration and structured tracing setup for the connector
// ABOUTME: Configures log level and output format from code or environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

//! Structured logging setup built on `tracing`.
//!
//! The library itself only emits events; installing a subscriber is the
//! application's call. These helpers cover the common case of one
//! process-wide subscriber configured from the environment.

use std::env;
use std::io;

use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::errors::{ConnectorError, ConnectorResult};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level directive (trace, debug, info, warn, error).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

/// Log output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` lines for production log pipelines.
    Json,
    /// Pretty format for development.
    Pretty,
    /// Compact single-line format.
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Configuration from `RUST_LOG` and `LOG_FORMAT`.
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };
        Self { level, format }
    }

    /// Install the global tracing subscriber.
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` when a subscriber is already
    /// installed.
    pub fn init(&self) -> ConnectorResult<()> {
        let env_filter = EnvFilter::try_new(&self.level)
            .unwrap_or_else(|_| EnvFilter::new("info"))
            .add_directive(
                format!("vitalbridge={}", self.level)
                    .parse()
                    .unwrap_or_else(|_| tracing::Level::INFO.into()),
            );
        let registry = tracing_subscriber::registry().with(env_filter);

        let result = match self.format {
            LogFormat::Json => {
                let layer = fmt::layer()
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(FmtSpan::NONE)
                    .json();
                registry.with(layer).try_init()
            }
            LogFormat::Pretty => {
                let layer = fmt::layer()
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(FmtSpan::NONE);
                registry.with(layer).try_init()
            }
            LogFormat::Compact => {
                let layer = fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stdout)
                    .with_span_events(FmtSpan::NONE);
                registry.with(layer).try_init()
            }
        };
        result
            .map_err(|e| ConnectorError::initialization(format!("logging setup failed: {e}")))?;

        info!(
            log.level = %self.level,
            log.format = ?self.format,
            "logging initialized"
        );
        Ok(())
    }
}

/// Initialize logging with the default configuration.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init_default() -> ConnectorResult<()> {
    LoggingConfig::default().init()
}

/// Initialize logging from the environment.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init_from_env() -> ConnectorResult<()> {
    LoggingConfig::from_env().init()
}
