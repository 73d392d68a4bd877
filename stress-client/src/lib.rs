//! # stress-client
//!
//! Connection layer for guac-stress.
//!
//! This crate defines the reader/writer capability contract the stress
//! tool consumes ([`InstructionReader`], [`InstructionWriter`]) and two
//! implementations:
//!
//! - [`connect`] / [`TcpConnection`] - a plain TCP transport
//! - [`MockConnection`] - a scriptable in-memory transport for tests
//!
//! The read and write sides are separate traits because the stress tool
//! statically partitions writer ownership: either the session loop or the
//! load generator holds the write half, never both.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod mock;
mod tcp;
mod transport;

pub use config::ConnectConfig;
pub use mock::{MockConnection, MockReader, MockWriter};
pub use tcp::{connect, TcpConnection, TcpReader, TcpWriter};
pub use transport::{InstructionReader, InstructionWriter, TransportError};
