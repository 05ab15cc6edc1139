#![doc(html_root_url = "https://docs.rs/hubline/latest")]
//! Public API for the `hubline` library.
//!
//! `hubline` wraps a persistent, bidirectional real-time hub transport in a
//! small façade: connect, fire-and-forget sends, request/response calls,
//! named inbound command handlers and lifecycle callbacks. The transport is
//! supplied by the caller through the [`transport`] traits; framing,
//! keep-alives and automatic reconnection stay its responsibility.

pub mod body;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod prelude;
pub mod response;
pub mod transport;

pub use body::Body;
pub use connection::{
    Connection,
    ConnectionBuilder,
    ConnectionConfig,
    DEFAULT_DISPATCH_METHOD,
    Endpoint,
};
pub use error::{ConnectionError, Result};
pub use response::{Response, ResponseError};
pub use transport::{
    ConnectionState,
    ErrorCallback,
    IdCallback,
    MethodHandler,
    Transport,
    TransportError,
    TransportHandle,
};

#[doc(hidden)]
pub mod __private {
    pub use serde_json::json;
    use serde_json::Value;

    /// Unpack the array produced by `body!` into a [`Body`](crate::Body).
    #[must_use]
    pub fn body(values: Value) -> crate::Body {
        match values {
            Value::Array(values) => crate::Body::from(values),
            other => crate::Body::from(other),
        }
    }
}
