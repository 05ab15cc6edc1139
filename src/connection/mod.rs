//! The [`Connection`] façade.
//!
//! A connection owns at most one transport handle at a time together with
//! the handler registry and lifecycle callback lists. Registries outlive
//! handles: each new handle is rebound with everything registered so far
//! before it is started.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::Instrument;

mod builder;
mod config;
mod messaging;
mod rebind;
mod registry;

pub use builder::ConnectionBuilder;
pub use config::{ConnectionConfig, DEFAULT_DISPATCH_METHOD};
use registry::{EventHandler, HandlerRegistry, LifecycleCallbacks};

use crate::{
    error::{ConnectionError, Result},
    transport::{ConnectionState, Transport, TransportError, TransportHandle},
};

/// The most recent endpoint a connection was successfully started against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Target address passed to [`Connection::connect`].
    pub url: String,
    /// Whether the transport was asked to reconnect automatically.
    pub auto_reconnect: bool,
}

/// Client façade over a real-time hub transport.
///
/// # Examples
///
/// ```ignore
/// use hubline::{Connection, body};
///
/// let connection = Connection::new(transport);
/// connection.on("Ping", |payload: serde_json::Value| println!("ping {payload}"));
/// connection.on_connected(|id| println!("connected as {id:?}"));
/// connection.connect("wss://host/hub", true).await?;
///
/// connection.send("Chat.Post", body!["general", "hello"]).await?;
/// let reply = connection.request::<u64>("Chat.Count", body!["general"]).await?;
/// ```
pub struct Connection<T: Transport> {
    transport: T,
    config: ConnectionConfig,
    handle: RwLock<Option<Arc<T::Handle>>>,
    /// Last successful endpoint; the guard also serialises connect,
    /// disconnect and the transparent reconnect path.
    endpoint: Mutex<Option<Endpoint>>,
    registry: Arc<HandlerRegistry>,
    callbacks: LifecycleCallbacks,
}

impl<T: Transport> Connection<T> {
    /// Create a connection over `transport` with the default configuration.
    #[must_use]
    pub fn new(transport: T) -> Self { Self::with_config(transport, ConnectionConfig::default()) }

    /// Start building a connection over `transport`.
    #[must_use]
    pub fn builder(transport: T) -> ConnectionBuilder<T> { ConnectionBuilder::new(transport) }

    /// Create a connection over `transport` with an explicit configuration.
    #[must_use]
    pub fn with_config(transport: T, config: ConnectionConfig) -> Self {
        Self {
            transport,
            config,
            handle: RwLock::new(None),
            endpoint: Mutex::new(None),
            registry: Arc::new(HandlerRegistry::default()),
            callbacks: LifecycleCallbacks::default(),
        }
    }

    /// Configuration applied to every handle.
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig { &self.config }

    /// Identity assigned by the transport, or `None` when there is no handle
    /// or it has not been assigned one.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.read_handle()
            .as_ref()
            .and_then(|handle| handle.connection_id())
    }

    /// Whether the current handle reports [`ConnectionState::Connected`].
    #[must_use]
    pub fn is_connected(&self) -> bool { self.state() == ConnectionState::Connected }

    /// State of the current handle; [`ConnectionState::Disconnected`] when
    /// there is none.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.read_handle()
            .as_ref()
            .map_or(ConnectionState::Disconnected, |handle| handle.state())
    }

    /// The endpoint used by the last successful [`connect`](Self::connect).
    pub async fn endpoint(&self) -> Option<Endpoint> { self.endpoint.lock().await.clone() }

    /// Whether a handler is registered for `command`.
    #[must_use]
    pub fn has_handler(&self, command: &str) -> bool { self.registry.contains(command) }

    /// Connect to `url`, replacing any existing handle.
    ///
    /// The previous handle, if any, is stopped first. The new handle is
    /// rebound with every registered handler and callback before it starts.
    /// On success the endpoint is recorded and the connected callbacks run
    /// with the new identity.
    ///
    /// # Errors
    /// Returns [`ConnectionError::EmptyUrl`] for an empty `url`, or
    /// [`ConnectionError::Transport`] if stopping the old handle, building
    /// the new one or starting it fails.
    pub async fn connect(&self, url: &str, auto_reconnect: bool) -> Result<()> {
        let mut endpoint = self.endpoint.lock().await;
        self.connect_locked(&mut endpoint, url, auto_reconnect)
            .instrument(tracing::info_span!("hub.connect", url, auto_reconnect))
            .await
    }

    /// Stop and drop the current handle. Does nothing when there is none.
    ///
    /// The endpoint is kept, so a later [`send`](Self::send) or
    /// [`request`](Self::request) reconnects transparently.
    ///
    /// # Errors
    /// Returns [`ConnectionError::Transport`] if the handle fails to stop;
    /// the handle is kept in that case.
    pub async fn disconnect(&self) -> Result<()> {
        let _gate = self.endpoint.lock().await;
        let Some(handle) = self.current_handle() else {
            return Ok(());
        };
        handle.stop().await?;
        *self.write_handle() = None;
        info!("disconnected");
        Ok(())
    }

    /// Register `handler` for inbound `command`, replacing any previous one.
    ///
    /// Payloads are decoded into `P`; payloads that fail to decode are logged
    /// and dropped. The handler is attached to the current handle at once.
    pub fn on<P, F>(&self, command: &str, handler: F)
    where
        P: DeserializeOwned + 'static,
        F: Fn(P) + Send + Sync + 'static,
    {
        let name = command.to_owned();
        let handler: EventHandler =
            Arc::new(
                move |payload: Value| match serde_json::from_value::<P>(payload) {
                    Ok(decoded) => handler(decoded),
                    Err(err) => warn!("dropping undecodable payload for command {name}: {err}"),
                },
            );

        let slot = self.read_handle();
        self.registry.insert(command, handler);
        if let Some(handle) = slot.as_ref() {
            rebind::attach_command(handle.as_ref(), &self.registry, &self.config, command);
        }
    }

    /// Remove the handler for `command`. Returns whether one was registered.
    pub fn off(&self, command: &str) -> bool {
        let slot = self.read_handle();
        let removed = self.registry.remove(command);
        if let Some(handle) = slot.as_ref() {
            rebind::detach_command(handle.as_ref(), &self.config, command);
        }
        removed
    }

    /// Register a callback run at the end of every successful
    /// [`connect`](Self::connect), including transparent reconnects.
    pub fn on_connected<F>(&self, callback: F)
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        self.callbacks.push_connected(Arc::new(callback));
    }

    /// Register a callback run when the transport starts reconnecting on
    /// its own.
    pub fn on_reconnecting<F>(&self, callback: F)
    where
        F: Fn(Option<&TransportError>) + Send + Sync + 'static,
    {
        let callback = Arc::new(callback);
        let slot = self.read_handle();
        self.callbacks.push_reconnecting(callback.clone());
        if let Some(handle) = slot.as_ref() {
            handle.on_reconnecting(callback);
        }
    }

    /// Register a callback run when the transport restores the connection
    /// on its own.
    pub fn on_reconnected<F>(&self, callback: F)
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        let callback = Arc::new(callback);
        let slot = self.read_handle();
        self.callbacks.push_reconnected(callback.clone());
        if let Some(handle) = slot.as_ref() {
            handle.on_reconnected(callback);
        }
    }

    /// Register a callback run when a handle closes.
    pub fn on_disconnected<F>(&self, callback: F)
    where
        F: Fn(Option<&TransportError>) + Send + Sync + 'static,
    {
        let callback = Arc::new(callback);
        let slot = self.read_handle();
        self.callbacks.push_disconnected(callback.clone());
        if let Some(handle) = slot.as_ref() {
            handle.on_close(callback);
        }
    }

    async fn connect_locked(
        &self,
        endpoint: &mut Option<Endpoint>,
        url: &str,
        auto_reconnect: bool,
    ) -> Result<()> {
        if url.is_empty() {
            return Err(ConnectionError::EmptyUrl);
        }
        if let Some(previous) = self.current_handle() {
            previous.stop().await?;
        }

        info!("connecting to {url}");
        let handle = Arc::new(self.transport.build(url, auto_reconnect)?);
        {
            let mut slot = self.write_handle();
            rebind::rebind(handle.as_ref(), &self.registry, &self.callbacks, &self.config);
            *slot = Some(Arc::clone(&handle));
        }

        handle.start().await?;
        *endpoint = Some(Endpoint {
            url: url.to_owned(),
            auto_reconnect,
        });

        let id = handle.connection_id();
        info!(
            "connected to {url} with id {}",
            id.as_deref().unwrap_or("<none>")
        );
        self.callbacks.notify_connected(id.as_deref());
        Ok(())
    }

    fn current_handle(&self) -> Option<Arc<T::Handle>> { self.read_handle().clone() }

    fn read_handle(&self) -> RwLockReadGuard<'_, Option<Arc<T::Handle>>> {
        self.handle.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_handle(&self) -> RwLockWriteGuard<'_, Option<Arc<T::Handle>>> {
        self.handle.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("id", &self.id())
            .finish_non_exhaustive()
    }
}
