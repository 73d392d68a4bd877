//! Transport capability contract.
//!
//! The stress tool never touches sockets directly; it consumes these two
//! traits. Any transport (plain TCP, TLS, in-memory mock) that satisfies
//! them is interchangeable.

use async_trait::async_trait;
use stress_proto::{Instruction, ProtoError};
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Establishing the connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Reading from the connection failed.
    #[error("read failed: {0}")]
    Read(String),

    /// Writing to the connection failed.
    #[error("write failed: {0}")]
    Write(String),

    /// The remote sent data that does not decode as protocol instructions.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtoError),
}

/// The read half of a connection: a stream of decoded instructions.
#[async_trait]
pub trait InstructionReader: Send {
    /// Read the next instruction.
    ///
    /// Returns `Ok(None)` when the remote closes the stream. Blocks until
    /// an instruction is available, the stream ends, or reading fails.
    async fn read_instruction(&mut self) -> Result<Option<Instruction>, TransportError>;
}

/// The write half of a connection.
#[async_trait]
pub trait InstructionWriter: Send {
    /// Encode and write one complete instruction.
    async fn write_instruction(&mut self, instruction: &Instruction)
        -> Result<(), TransportError>;

    /// Write raw bytes exactly as given, with no framing applied.
    ///
    /// This is the load generator's channel: it deliberately writes data
    /// whose boundaries do not align with instruction framing.
    async fn write_raw(&mut self, data: &[u8]) -> Result<(), TransportError>;
}
