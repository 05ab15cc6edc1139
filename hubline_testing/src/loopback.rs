//! In-memory transport standing in for a real hub connection.

use std::{
    collections::HashMap,
    io,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use hubline::{
    ConnectionState,
    DEFAULT_DISPATCH_METHOD,
    ErrorCallback,
    IdCallback,
    MethodHandler,
    Transport,
    TransportError,
    TransportHandle,
};
use serde_json::Value;

/// Computes the remote result of an invocation.
pub type Responder = Arc<dyn Fn(&str, &[Value]) -> Result<Value, TransportError> + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One invocation received by the hub.
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    /// Identity of the handle that sent it.
    pub connection_id: Option<String>,
    /// Remote method name.
    pub method: String,
    /// Positional arguments.
    pub arguments: Vec<Value>,
}

impl Invocation {
    /// The routing address, when the invocation uses the dispatch shape.
    #[must_use]
    pub fn address(&self) -> Option<&str> { self.arguments.first().and_then(Value::as_str) }

    /// The body values, when the invocation uses the dispatch shape.
    #[must_use]
    pub fn body(&self) -> Option<&[Value]> {
        self.arguments
            .get(1)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    }
}

#[derive(Default)]
struct HubState {
    responder: Option<Responder>,
    refuse: bool,
    handles: Vec<Weak<HandleInner>>,
    invocations: Vec<Invocation>,
    endpoints: Vec<(String, bool)>,
    starts: usize,
}

/// The simulated remote end shared by every handle of a
/// [`LoopbackTransport`].
#[derive(Default)]
pub struct LoopbackHub {
    state: Mutex<HubState>,
    next_id: AtomicU64,
}

impl LoopbackHub {
    /// Answer every invocation with `responder`. Without one, invocations
    /// complete with `null`.
    pub fn respond_with<F>(&self, responder: F)
    where
        F: Fn(&str, &[Value]) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        lock(&self.state).responder = Some(Arc::new(responder));
    }

    /// Make subsequent `start` calls fail (or succeed again).
    pub fn refuse_connections(&self, refuse: bool) { lock(&self.state).refuse = refuse; }

    /// Every invocation received so far, in arrival order.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> { lock(&self.state).invocations.clone() }

    /// Every `(url, auto_reconnect)` a handle was built for, in order.
    #[must_use]
    pub fn endpoints(&self) -> Vec<(String, bool)> { lock(&self.state).endpoints.clone() }

    /// Number of successful `start` calls.
    #[must_use]
    pub fn starts(&self) -> usize { lock(&self.state).starts }

    /// Invoke `method` on every connected handle. Returns the number of
    /// handles that had a handler for it.
    pub fn push(&self, method: &str, args: &[Value]) -> usize {
        let mut delivered = 0;
        for handle in self.live_handles() {
            if handle.state() != ConnectionState::Connected {
                continue;
            }
            let handler = lock(&handle.methods).get(method).cloned();
            if let Some(handler) = handler {
                handler(args.to_vec());
                delivered += 1;
            }
        }
        delivered
    }

    /// Push `(command, payload)` through the default dispatch method.
    pub fn dispatch(&self, command: &str, payload: Value) -> usize {
        self.push(
            DEFAULT_DISPATCH_METHOD,
            &[Value::String(command.to_owned()), payload],
        )
    }

    /// Simulate a lost connection on every connected handle.
    ///
    /// Handles built with automatic reconnection move to `Reconnecting` and
    /// fire their reconnecting callbacks; the others close.
    pub fn interrupt(&self, error: Option<&TransportError>) {
        for handle in self.live_handles() {
            if handle.state() != ConnectionState::Connected {
                continue;
            }
            if handle.auto_reconnect {
                handle.set(ConnectionState::Reconnecting, None);
                for callback in lock(&handle.reconnecting).clone() {
                    callback(error);
                }
            } else {
                handle.close(error);
            }
        }
    }

    /// Complete the automatic reconnection of every `Reconnecting` handle,
    /// assigning each a fresh identity.
    pub fn restore(&self) -> usize {
        let mut restored = 0;
        for handle in self.live_handles() {
            if handle.state() != ConnectionState::Reconnecting {
                continue;
            }
            let id = self.next_connection_id();
            handle.set(ConnectionState::Connected, Some(id.clone()));
            for callback in lock(&handle.reconnected).clone() {
                callback(Some(&id));
            }
            restored += 1;
        }
        restored
    }

    /// Close every handle that is not already disconnected, as a transport
    /// does when it gives up reconnecting.
    pub fn drop_connections(&self, error: Option<&TransportError>) {
        for handle in self.live_handles() {
            if handle.state() != ConnectionState::Disconnected {
                handle.close(error);
            }
        }
    }

    fn live_handles(&self) -> Vec<Arc<HandleInner>> {
        let mut state = lock(&self.state);
        state.handles.retain(|weak| weak.strong_count() > 0);
        state.handles.iter().filter_map(Weak::upgrade).collect()
    }

    fn next_connection_id(&self) -> String {
        format!("conn-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// [`Transport`] whose handles talk to a shared in-memory [`LoopbackHub`].
#[derive(Clone, Default)]
pub struct LoopbackTransport {
    hub: Arc<LoopbackHub>,
}

impl LoopbackTransport {
    /// Create a transport with a fresh hub.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// The hub shared by all handles of this transport.
    #[must_use]
    pub fn hub(&self) -> Arc<LoopbackHub> { Arc::clone(&self.hub) }
}

impl Transport for LoopbackTransport {
    type Handle = LoopbackHandle;

    fn build(&self, url: &str, auto_reconnect: bool) -> Result<Self::Handle, TransportError> {
        if !url.contains("://") {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a hub url: {url}"),
            )));
        }
        let inner = Arc::new(HandleInner {
            auto_reconnect,
            status: Mutex::new((ConnectionState::Disconnected, None)),
            methods: Mutex::default(),
            reconnecting: Mutex::default(),
            reconnected: Mutex::default(),
            closed: Mutex::default(),
        });
        let mut state = lock(&self.hub.state);
        state.handles.push(Arc::downgrade(&inner));
        state.endpoints.push((url.to_owned(), auto_reconnect));
        drop(state);

        Ok(LoopbackHandle {
            inner,
            hub: Arc::clone(&self.hub),
        })
    }
}

struct HandleInner {
    auto_reconnect: bool,
    status: Mutex<(ConnectionState, Option<String>)>,
    methods: Mutex<HashMap<String, MethodHandler>>,
    reconnecting: Mutex<Vec<ErrorCallback>>,
    reconnected: Mutex<Vec<IdCallback>>,
    closed: Mutex<Vec<ErrorCallback>>,
}

impl HandleInner {
    fn state(&self) -> ConnectionState { lock(&self.status).0 }

    fn set(&self, state: ConnectionState, id: Option<String>) {
        *lock(&self.status) = (state, id);
    }

    fn close(&self, error: Option<&TransportError>) {
        self.set(ConnectionState::Disconnected, None);
        for callback in lock(&self.closed).clone() {
            callback(error);
        }
    }
}

/// A handle produced by [`LoopbackTransport`].
pub struct LoopbackHandle {
    inner: Arc<HandleInner>,
    hub: Arc<LoopbackHub>,
}

#[async_trait]
impl TransportHandle for LoopbackHandle {
    async fn start(&self) -> Result<(), TransportError> {
        if self.inner.state() == ConnectionState::Connected {
            return Ok(());
        }
        self.inner.set(ConnectionState::Connecting, None);
        tokio::task::yield_now().await;

        if lock(&self.hub.state).refuse {
            self.inner.set(ConnectionState::Disconnected, None);
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "hub refused the connection",
            )));
        }
        let id = self.hub.next_connection_id();
        self.inner.set(ConnectionState::Connected, Some(id));
        lock(&self.hub.state).starts += 1;
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        if self.inner.state() == ConnectionState::Disconnected {
            return Ok(());
        }
        self.inner.close(None);
        Ok(())
    }

    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError> {
        if self.inner.state() != ConnectionState::Connected {
            return Err(TransportError::NotConnected);
        }
        let responder = {
            let mut state = lock(&self.hub.state);
            state.invocations.push(Invocation {
                connection_id: self.connection_id(),
                method: method.to_owned(),
                arguments: args.clone(),
            });
            state.responder.clone()
        };
        tokio::task::yield_now().await;

        match responder {
            Some(responder) => responder(method, &args),
            None => Ok(Value::Null),
        }
    }

    fn state(&self) -> ConnectionState { self.inner.state() }

    fn connection_id(&self) -> Option<String> { lock(&self.inner.status).1.clone() }

    fn on(&self, method: &str, handler: MethodHandler) {
        lock(&self.inner.methods).insert(method.to_owned(), handler);
    }

    fn off(&self, method: &str) { lock(&self.inner.methods).remove(method); }

    fn on_reconnecting(&self, callback: ErrorCallback) {
        lock(&self.inner.reconnecting).push(callback);
    }

    fn on_reconnected(&self, callback: IdCallback) { lock(&self.inner.reconnected).push(callback); }

    fn on_close(&self, callback: ErrorCallback) { lock(&self.inner.closed).push(callback); }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn start_assigns_sequential_ids() {
        let transport = LoopbackTransport::new();
        let first = transport.build("loop://a", false).expect("build");
        let second = transport.build("loop://b", true).expect("build");

        first.start().await.expect("start");
        second.start().await.expect("start");

        assert_eq!(first.connection_id().as_deref(), Some("conn-1"));
        assert_eq!(second.connection_id().as_deref(), Some("conn-2"));
        assert_eq!(
            transport.hub().endpoints(),
            vec![("loop://a".to_owned(), false), ("loop://b".to_owned(), true)]
        );
    }

    #[tokio::test]
    async fn refused_start_leaves_handle_disconnected() {
        let transport = LoopbackTransport::new();
        transport.hub().refuse_connections(true);
        let handle = transport.build("loop://a", false).expect("build");

        assert!(handle.start().await.is_err());
        assert_eq!(handle.state(), ConnectionState::Disconnected);
        assert_eq!(transport.hub().starts(), 0);
    }

    #[tokio::test]
    async fn invoke_requires_connection() {
        let transport = LoopbackTransport::new();
        let handle = transport.build("loop://a", false).expect("build");

        let err = handle.invoke("M", vec![]).await.expect_err("not started");
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[tokio::test]
    async fn invoke_records_and_answers() {
        let transport = LoopbackTransport::new();
        let hub = transport.hub();
        hub.respond_with(|_, args| Ok(json!({ "result": args.len() })));
        let handle = transport.build("loop://a", false).expect("build");
        handle.start().await.expect("start");

        let value = handle
            .invoke("HandleAction", vec![json!("A"), json!([1])])
            .await
            .expect("invoke");

        assert_eq!(value, json!({ "result": 2 }));
        let recorded = hub.invocations();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].address(), Some("A"));
        assert_eq!(recorded[0].body(), Some(&[json!(1)][..]));
    }

    #[test]
    fn malformed_url_is_rejected() {
        let transport = LoopbackTransport::new();
        assert!(transport.build("no-scheme", false).is_err());
    }
}
