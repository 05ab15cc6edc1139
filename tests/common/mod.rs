//! Shared fixtures for `hubline` integration tests.
//!
//! Every fixture wires a [`Connection`] to an in-memory loopback hub so tests
//! can play the remote end.

#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::sync::{Arc, Mutex};

use hubline::Connection;
use hubline_testing::{LoopbackHub, LoopbackTransport};
use rstest::fixture;

/// Endpoint used by most tests.
pub const HUB_URL: &str = "wss://host/hub";

/// A connection and the hub playing its remote end.
pub struct Harness {
    pub connection: Connection<LoopbackTransport>,
    pub hub: Arc<LoopbackHub>,
}

/// Unconnected connection over a fresh loopback hub.
#[fixture]
pub fn harness() -> Harness {
    let transport = LoopbackTransport::new();
    let hub = transport.hub();
    Harness {
        connection: Connection::new(transport),
        hub,
    }
}

/// Shared, ordered record of events observed by callbacks.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().expect("event log poisoned").push(event.into());
    }

    pub fn events(&self) -> Vec<String> { self.0.lock().expect("event log poisoned").clone() }

    pub fn len(&self) -> usize { self.0.lock().expect("event log poisoned").len() }
}
