//! Registries owned by a connection independently of any handle.
//!
//! Both registries outlive the handles they are replayed onto, so nothing
//! registered by the caller is lost when a handle is replaced.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dashmap::DashMap;
use log::debug;
use serde_json::Value;

use crate::transport::{ErrorCallback, IdCallback};

/// Handler invoked with the payload of an inbound command.
pub(crate) type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// Command name to handler map. The last registration for a command wins.
#[derive(Default)]
pub(crate) struct HandlerRegistry(DashMap<String, EventHandler>);

impl HandlerRegistry {
    /// Register `handler` for `command`, returning `true` if it replaced an
    /// earlier one.
    pub(crate) fn insert(&self, command: &str, handler: EventHandler) -> bool {
        self.0.insert(command.to_owned(), handler).is_some()
    }

    pub(crate) fn remove(&self, command: &str) -> bool { self.0.remove(command).is_some() }

    pub(crate) fn contains(&self, command: &str) -> bool { self.0.contains_key(command) }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.0.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Route `payload` to the handler registered for `command`.
    ///
    /// The handler runs after the map guard is released, so it may register
    /// or remove handlers itself.
    pub(crate) fn dispatch(&self, command: &str, payload: Value) -> bool {
        let handler = self.0.get(command).map(|entry| Arc::clone(entry.value()));
        match handler {
            Some(handler) => {
                handler(payload);
                true
            }
            None => {
                debug!("no handler registered for command {command}");
                false
            }
        }
    }
}

/// Ordered lifecycle callback lists.
#[derive(Default)]
pub(crate) struct LifecycleCallbacks {
    connected: RwLock<Vec<IdCallback>>,
    reconnecting: RwLock<Vec<ErrorCallback>>,
    reconnected: RwLock<Vec<IdCallback>>,
    disconnected: RwLock<Vec<ErrorCallback>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl LifecycleCallbacks {
    pub(crate) fn push_connected(&self, callback: IdCallback) {
        write(&self.connected).push(callback);
    }

    pub(crate) fn push_reconnecting(&self, callback: ErrorCallback) {
        write(&self.reconnecting).push(callback);
    }

    pub(crate) fn push_reconnected(&self, callback: IdCallback) {
        write(&self.reconnected).push(callback);
    }

    pub(crate) fn push_disconnected(&self, callback: ErrorCallback) {
        write(&self.disconnected).push(callback);
    }

    pub(crate) fn reconnecting(&self) -> Vec<ErrorCallback> { read(&self.reconnecting).clone() }

    pub(crate) fn reconnected(&self) -> Vec<IdCallback> { read(&self.reconnected).clone() }

    pub(crate) fn disconnected(&self) -> Vec<ErrorCallback> { read(&self.disconnected).clone() }

    /// Invoke every connected callback, in registration order.
    pub(crate) fn notify_connected(&self, id: Option<&str>) {
        let callbacks = read(&self.connected).clone();
        for callback in callbacks {
            callback(id);
        }
    }
}
