//! Replays registered state onto a freshly built transport handle.

use std::sync::Arc;

use log::{info, warn};
use serde_json::Value;

use super::{
    ConnectionConfig,
    registry::{HandlerRegistry, LifecycleCallbacks},
};
use crate::transport::{MethodHandler, TransportError, TransportHandle};

/// Attach the dispatcher, every registered command and every lifecycle
/// callback to `handle`.
///
/// Must run before `handle` is started so no inbound traffic or lifecycle
/// signal can be missed.
pub(super) fn rebind<H: TransportHandle>(
    handle: &H,
    registry: &Arc<HandlerRegistry>,
    callbacks: &LifecycleCallbacks,
    config: &ConnectionConfig,
) {
    handle.on(config.dispatch_method(), dispatcher(registry));
    for command in registry.commands() {
        attach_command(handle, registry, config, &command);
    }

    if config.lifecycle_logging() {
        handle.on_reconnecting(Arc::new(log_reconnecting));
        handle.on_reconnected(Arc::new(log_reconnected));
        handle.on_close(Arc::new(log_closed));
    }

    for callback in callbacks.reconnecting() {
        handle.on_reconnecting(callback);
    }
    for callback in callbacks.reconnected() {
        handle.on_reconnected(callback);
    }
    for callback in callbacks.disconnected() {
        handle.on_close(callback);
    }
}

/// Attach the direct per-command route for `command`.
///
/// A command sharing the dispatch method's name is only reachable through
/// the dispatcher.
pub(super) fn attach_command<H: TransportHandle>(
    handle: &H,
    registry: &Arc<HandlerRegistry>,
    config: &ConnectionConfig,
    command: &str,
) {
    if command == config.dispatch_method() {
        return;
    }
    let registry = Arc::clone(registry);
    let name = command.to_owned();
    handle.on(
        command,
        Arc::new(move |args: Vec<Value>| {
            registry.dispatch(&name, direct_payload(args));
        }),
    );
}

/// Detach the direct route for `command`, leaving the dispatcher intact.
pub(super) fn detach_command<H: TransportHandle>(
    handle: &H,
    config: &ConnectionConfig,
    command: &str,
) {
    if command != config.dispatch_method() {
        handle.off(command);
    }
}

/// Route `(command, payload)` invocations of the dispatch method.
fn dispatcher(registry: &Arc<HandlerRegistry>) -> MethodHandler {
    let registry = Arc::clone(registry);
    Arc::new(move |args: Vec<Value>| {
        let mut args = args.into_iter();
        match args.next() {
            Some(Value::String(command)) => {
                let payload = args.next().unwrap_or(Value::Null);
                registry.dispatch(&command, payload);
            }
            other => warn!("ignoring dispatch without a command name: {other:?}"),
        }
    })
}

fn direct_payload(mut args: Vec<Value>) -> Value {
    match args.len() {
        0 => Value::Null,
        1 => args.pop().unwrap_or(Value::Null),
        _ => Value::Array(args),
    }
}

fn log_reconnecting(error: Option<&TransportError>) {
    match error {
        Some(err) => warn!("connection lost, reconnecting: {err}"),
        None => warn!("connection lost, reconnecting"),
    }
}

fn log_reconnected(id: Option<&str>) {
    info!("reconnected with id {}", id.unwrap_or("<none>"));
}

fn log_closed(error: Option<&TransportError>) {
    match error {
        Some(err) => warn!("connection closed: {err}"),
        None => info!("connection closed"),
    }
}
