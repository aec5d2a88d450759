/*!
 * Request Tracing
 * Structured tracing for engine requests using the tracing crate
 *
 * Features:
 * - Trace ID per request for correlating the log lines it produces
 * - JSON-formatted logs for structured parsing
 * - Library `log` records bridged into the same subscriber
 */

use crate::core::limits::SLOW_OPERATION_THRESHOLD;
use crate::core::types::Pid;
use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - MEMSIM_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("MEMSIM_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Generate a unique trace ID for request correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one engine request
pub struct RequestSpan {
    span: tracing::Span,
    start: Instant,
    request: &'static str,
    trace_id: String,
}

impl RequestSpan {
    pub fn new(request: &'static str, pid: Option<Pid>) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::DEBUG,
            "request",
            trace_id = %trace_id,
            request = request,
            pid = tracing::field::Empty,
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
            error = tracing::field::Empty,
        );
        if let Some(pid) = pid {
            span.record("pid", pid);
        }

        span.in_scope(|| debug!(request = request, "request started"));

        Self {
            span,
            start: Instant::now(),
            request,
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Record the request result
    pub fn record_result(&self, success: bool) {
        self.span
            .record("result", if success { "success" } else { "error" });
    }

    /// Record an error
    pub fn record_error(&self, error: &str) {
        self.span.record("error", error);
        self.span.record("result", "error");
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for RequestSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration > SLOW_OPERATION_THRESHOLD {
            warn!(
                trace_id = %self.trace_id,
                request = self.request,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow request detected"
            );
        } else {
            debug!(
                trace_id = %self.trace_id,
                request = self.request,
                duration_us = duration.as_micros() as u64,
                "request completed"
            );
        }
    }
}

/// Helper to create a request span
#[inline]
pub fn span_request(request: &'static str, pid: Option<Pid>) -> RequestSpan {
    RequestSpan::new(request, pid)
}
