//! Diagnostic sink for non-fatal anomalies.
//!
//! The engine never logs through a global: callers inject a sink and decide
//! where warnings go. `TracingSink` forwards to the `tracing` macros for
//! embedding hosts; `NullSink` discards everything (tests).

/// Receiver for warning/verbose diagnostics emitted during aggregation.
///
/// Implementations must be cheap and infallible; the engine calls these on
/// its hot path for conditions like "queue unavailable" or "slot rejected".
pub trait DiagnosticSink {
    /// Non-fatal anomaly worth surfacing (queue unavailable, slot rejected).
    fn warn(&self, message: &str);

    /// Per-slot merge detail, interesting only when debugging a client.
    fn verbose(&self, message: &str);
}

/// Sink that forwards to `tracing::warn!` / `tracing::trace!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn verbose(&self, message: &str) {
        tracing::trace!("{message}");
    }
}

/// Sink that discards all diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn warn(&self, _message: &str) {}

    fn verbose(&self, _message: &str) {}
}
