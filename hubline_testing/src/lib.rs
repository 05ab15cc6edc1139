//! Utilities for exercising a [`hubline::Connection`] without a network.
//!
//! [`LoopbackTransport`] implements the transport seam in memory. The
//! [`LoopbackHub`] it shares plays the remote end: it answers invocations,
//! pushes inbound commands and simulates dropped or restored connections.
//!
//! ```rust
//! use hubline::Connection;
//! use hubline_testing::LoopbackTransport;
//!
//! # async fn example() -> hubline::Result<()> {
//! let transport = LoopbackTransport::new();
//! let hub = transport.hub();
//! let connection = Connection::new(transport);
//! connection.connect("loop://hub", false).await?;
//! assert_eq!(hub.starts(), 1);
//! # Ok(())
//! # }
//! ```

pub mod logging;
pub mod loopback;
mod macros;

pub use logging::{LoggerHandle, logger};
pub use loopback::{Invocation, LoopbackHandle, LoopbackHub, LoopbackTransport, Responder};
