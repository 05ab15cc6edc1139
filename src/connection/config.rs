//! Configuration applied to every handle a [`Connection`](super::Connection)
//! creates.

/// Remote operation name used when no other is configured.
pub const DEFAULT_DISPATCH_METHOD: &str = "HandleAction";

/// Settings shared by all handles of a connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    dispatch_method: String,
    lifecycle_logging: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            dispatch_method: DEFAULT_DISPATCH_METHOD.to_owned(),
            lifecycle_logging: true,
        }
    }
}

impl ConnectionConfig {
    /// Return the remote operation every send, request and multiplexed push
    /// travels through.
    #[must_use]
    pub fn dispatch_method(&self) -> &str { &self.dispatch_method }

    /// Whether built-in lifecycle logging callbacks are attached.
    #[must_use]
    pub fn lifecycle_logging(&self) -> bool { self.lifecycle_logging }

    /// Set the dispatch method name.
    #[must_use]
    pub fn with_dispatch_method(mut self, method: impl Into<String>) -> Self {
        self.dispatch_method = method.into();
        self
    }

    /// Enable or disable built-in lifecycle logging.
    #[must_use]
    pub fn with_lifecycle_logging(mut self, enabled: bool) -> Self {
        self.lifecycle_logging = enabled;
        self
    }
}
