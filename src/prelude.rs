//! Optional convenience imports for common `hubline` workflows.
//!
//! ```rust
//! use hubline::prelude::*;
//!
//! fn empty() -> Body { body![] }
//! ```

pub use crate::{
    body,
    body::Body,
    connection::{Connection, ConnectionBuilder, ConnectionConfig},
    error::{ConnectionError, Result},
    response::{Response, ResponseError},
    transport::{ConnectionState, Transport, TransportError, TransportHandle},
};
