//! Metric helpers for `hubline`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking outbound invocations.
pub const INVOCATIONS_TOTAL: &str = "hubline_invocations_total";
/// Name of the counter tracking transparent reconnects.
pub const RECONNECTS_TOTAL: &str = "hubline_reconnects_total";
/// Name of the counter tracking failed operations.
pub const ERRORS_TOTAL: &str = "hubline_errors_total";

/// Kind of outbound invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvocationKind {
    /// Fire-and-forget `send`.
    Send,
    /// Awaited `request`.
    Request,
}

impl InvocationKind {
    /// Label value used for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InvocationKind::Send => "send",
            InvocationKind::Request => "request",
        }
    }
}

/// Record an outbound invocation of the given kind.
#[cfg_attr(not(feature = "metrics"), expect(unused_variables, reason = "no-op build"))]
pub fn inc_invocations(kind: InvocationKind) {
    #[cfg(feature = "metrics")]
    counter!(INVOCATIONS_TOTAL, "kind" => kind.as_str()).increment(1);
}

/// Record a transparent reconnect.
pub fn inc_reconnects() {
    #[cfg(feature = "metrics")]
    counter!(RECONNECTS_TOTAL).increment(1);
}

/// Record a failed operation.
pub fn inc_errors() {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL).increment(1);
}
