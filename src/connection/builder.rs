//! Builder for [`Connection`].

use super::{Connection, ConnectionConfig};
use crate::transport::Transport;

/// Builder for [`Connection`].
///
/// # Examples
///
/// ```ignore
/// use hubline::Connection;
///
/// let connection = Connection::builder(transport)
///     .dispatch_method("Relay")
///     .lifecycle_logging(false)
///     .build();
/// ```
pub struct ConnectionBuilder<T> {
    transport: T,
    config: ConnectionConfig,
}

impl<T: Transport> ConnectionBuilder<T> {
    /// Start a builder around `transport` with default settings.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: ConnectionConfig::default(),
        }
    }

    /// Use `method` as the remote operation for sends, requests and
    /// multiplexed pushes.
    #[must_use]
    pub fn dispatch_method(mut self, method: impl Into<String>) -> Self {
        self.config = self.config.with_dispatch_method(method);
        self
    }

    /// Attach (or not) the built-in lifecycle logging callbacks to every
    /// handle.
    #[must_use]
    pub fn lifecycle_logging(mut self, enabled: bool) -> Self {
        self.config = self.config.with_lifecycle_logging(enabled);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Finish building the connection. No network I/O happens until
    /// [`Connection::connect`] is called.
    #[must_use]
    pub fn build(self) -> Connection<T> { Connection::with_config(self.transport, self.config) }
}
