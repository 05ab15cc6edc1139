//! Outbound messaging: `send`, `request` and the transparent reconnect that
//! precedes them.

use std::sync::Arc;

use log::warn;
use serde::de::DeserializeOwned;
use tracing::Instrument;

use super::Connection;
use crate::{
    body::Body,
    error::{ConnectionError, Result},
    metrics::{self, InvocationKind},
    response::Response,
    transport::{ConnectionState, Transport, TransportHandle},
};

impl<T: Transport> Connection<T> {
    /// Invoke `address` on the remote end without awaiting a result value.
    ///
    /// Reconnects to the last endpoint first if the connection was dropped.
    ///
    /// # Errors
    /// Returns [`ConnectionError::NotInitialized`] if no endpoint was ever
    /// connected, or [`ConnectionError::Transport`] if the reconnect or the
    /// invocation fails.
    pub async fn send(&self, address: &str, body: impl Into<Body>) -> Result<()> {
        let body = body.into();
        async {
            let handle = self.ensure_connected().await?;
            metrics::inc_invocations(InvocationKind::Send);
            handle
                .invoke(self.config.dispatch_method(), body.into_arguments(address))
                .await?;
            Ok::<(), ConnectionError>(())
        }
        .instrument(tracing::debug_span!("hub.invoke", address, kind = "send"))
        .await
        .inspect_err(|_| metrics::inc_errors())
    }

    /// Invoke `address` on the remote end and return its response envelope.
    ///
    /// Application errors arrive as [`Response::Error`] and are returned as
    /// they are; only transport failures and malformed envelopes are errors.
    ///
    /// # Errors
    /// Returns [`ConnectionError::NotInitialized`] if no endpoint was ever
    /// connected, [`ConnectionError::Transport`] if the reconnect or the
    /// invocation fails, or [`ConnectionError::Decode`] if the returned value
    /// is not an envelope of `R`.
    pub async fn request<R>(&self, address: &str, body: impl Into<Body>) -> Result<Response<R>>
    where
        R: DeserializeOwned,
    {
        let body = body.into();
        async {
            let handle = self.ensure_connected().await?;
            metrics::inc_invocations(InvocationKind::Request);
            let value = handle
                .invoke(self.config.dispatch_method(), body.into_arguments(address))
                .await?;
            serde_json::from_value::<Response<R>>(value).map_err(ConnectionError::Decode)
        }
        .instrument(tracing::debug_span!("hub.invoke", address, kind = "request"))
        .await
        .inspect_err(|_| metrics::inc_errors())
    }

    /// Return a usable handle, reconnecting once to the last endpoint when
    /// there is no handle or it reports `Disconnected`.
    ///
    /// Callers queue on the endpoint guard, so concurrent callers observing
    /// the same dropped connection trigger a single reconnect.
    async fn ensure_connected(&self) -> Result<Arc<T::Handle>> {
        let mut endpoint = self.endpoint.lock().await;
        let Some(last) = endpoint.clone() else {
            return Err(ConnectionError::NotInitialized);
        };
        if let Some(handle) = self.current_handle() {
            if handle.state() != ConnectionState::Disconnected {
                return Ok(handle);
            }
        }

        warn!("reconnecting to the last known endpoint {}", last.url);
        metrics::inc_reconnects();
        self.connect_locked(&mut endpoint, &last.url, last.auto_reconnect)
            .await?;
        self.current_handle().ok_or(ConnectionError::NotInitialized)
    }
}
