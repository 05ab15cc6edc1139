//! The seam between a [`Connection`](crate::Connection) and the real-time
//! transport that carries its traffic.
//!
//! `hubline` never speaks a wire protocol itself. A [`Transport`] builds
//! [`TransportHandle`]s, each representing one live connection instance to a
//! hub endpoint. The handle owns framing, keep-alives, automatic reconnection
//! and backoff; the façade only drives it through the methods below.

use std::{fmt, io, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;

/// Connection state reported by a [`TransportHandle`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No connection is established.
    #[default]
    Disconnected,
    /// The initial connection attempt is in progress.
    Connecting,
    /// The connection is live.
    Connected,
    /// The connection was lost and the transport is trying to restore it.
    Reconnecting,
}

impl ConnectionState {
    fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Errors reported across the transport seam.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An operation required a live connection.
    #[error("transport is not connected")]
    NotConnected,
    /// The remote end closed the connection.
    #[error("connection closed by peer")]
    Closed,
    /// Socket level failure.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
    /// The remote end rejected or failed an invocation.
    #[error("invocation failed: {0}")]
    Invocation(String),
    /// Any other transport specific failure.
    #[error("transport error: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Handler attached to a remote method name; receives the positional
/// arguments of each inbound invocation.
pub type MethodHandler = Arc<dyn Fn(Vec<Value>) + Send + Sync>;

/// Callback for lifecycle signals that may carry an error (reconnecting,
/// closed).
pub type ErrorCallback = Arc<dyn Fn(Option<&TransportError>) + Send + Sync>;

/// Callback for lifecycle signals that carry a connection identity
/// (connected, reconnected).
pub type IdCallback = Arc<dyn Fn(Option<&str>) + Send + Sync>;

/// Factory for transport handles.
pub trait Transport: Send + Sync + 'static {
    /// Handle type produced by [`build`](Self::build).
    type Handle: TransportHandle;

    /// Build an unstarted handle targeting `url`.
    ///
    /// The handle performs automatic reconnection only when `auto_reconnect`
    /// is `true`.
    ///
    /// # Errors
    /// Returns [`TransportError`] if the handle cannot be configured, for
    /// example when `url` is malformed.
    fn build(&self, url: &str, auto_reconnect: bool) -> Result<Self::Handle, TransportError>;
}

/// One connection instance to a hub endpoint.
///
/// Registration methods are synchronous and may be called before or after
/// [`start`](Self::start). Callbacks may be invoked from any task the
/// transport owns.
#[async_trait]
pub trait TransportHandle: Send + Sync + 'static {
    /// Open the connection.
    ///
    /// # Errors
    /// Returns [`TransportError`] when the connection cannot be established.
    async fn start(&self) -> Result<(), TransportError>;

    /// Close the connection. Fires the close callbacks.
    ///
    /// # Errors
    /// Returns [`TransportError`] if the connection cannot be shut down
    /// cleanly.
    async fn stop(&self) -> Result<(), TransportError>;

    /// Invoke `method` on the remote end with positional `args` and await
    /// its completion value.
    ///
    /// # Errors
    /// Returns [`TransportError`] if the invocation cannot be delivered or
    /// the remote end fails it.
    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError>;

    /// Current state of this handle.
    fn state(&self) -> ConnectionState;

    /// Identity assigned by the remote end, if connected.
    fn connection_id(&self) -> Option<String>;

    /// Attach `handler` to inbound invocations of `method`, replacing any
    /// handler previously attached for it.
    fn on(&self, method: &str, handler: MethodHandler);

    /// Detach the handler for `method`.
    fn off(&self, method: &str);

    /// Register a callback fired when the transport starts reconnecting.
    fn on_reconnecting(&self, callback: ErrorCallback);

    /// Register a callback fired when an automatic reconnection succeeds.
    fn on_reconnected(&self, callback: IdCallback);

    /// Register a callback fired when the connection closes.
    fn on_close(&self, callback: ErrorCallback);
}
