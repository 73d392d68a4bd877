//! Plain TCP transport.

use async_trait::async_trait;
use stress_proto::{Instruction, InstructionParser};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::{ConnectConfig, InstructionReader, InstructionWriter, TransportError};

const READ_BUFFER_SIZE: usize = 8192;

/// An established TCP connection to a Guacamole gateway.
///
/// Split into owned reader/writer halves with [`split`](Self::split) so
/// the two sides can live on different tasks.
#[derive(Debug)]
pub struct TcpConnection {
    reader: TcpReader,
    writer: TcpWriter,
}

impl TcpConnection {
    /// Split into independently owned read and write halves.
    pub fn split(self) -> (TcpReader, TcpWriter) {
        (self.reader, self.writer)
    }
}

/// Open a TCP connection to `host:port` for the configured session.
///
/// Session negotiation is assumed to be handled by the remote side's own
/// configuration for `config.protocol`; this function only establishes
/// the transport and returns the instruction stream as-is.
pub async fn connect(
    host: &str,
    port: u16,
    config: &ConnectConfig,
) -> Result<TcpConnection, TransportError> {
    tracing::debug!(
        "Connecting to {}:{} (protocol {})",
        host,
        port,
        config.protocol
    );
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
    // The dispatch loop measures per-frame latency; coalescing delay would
    // distort it.
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!("Could not disable Nagle's algorithm: {}", e);
    }

    let (read, write) = stream.into_split();
    Ok(TcpConnection {
        reader: TcpReader {
            read,
            parser: InstructionParser::new(),
            buf: vec![0; READ_BUFFER_SIZE],
        },
        writer: TcpWriter { write },
    })
}

/// Read half of a [`TcpConnection`].
#[derive(Debug)]
pub struct TcpReader {
    read: OwnedReadHalf,
    parser: InstructionParser,
    buf: Vec<u8>,
}

#[async_trait]
impl InstructionReader for TcpReader {
    async fn read_instruction(&mut self) -> Result<Option<Instruction>, TransportError> {
        loop {
            if let Some(instruction) = self.parser.next_instruction() {
                return Ok(Some(instruction));
            }
            let n = self
                .read
                .read(&mut self.buf)
                .await
                .map_err(|e| TransportError::Read(e.to_string()))?;
            if n == 0 {
                return Ok(None);
            }
            self.parser.feed(&self.buf[..n])?;
        }
    }
}

/// Write half of a [`TcpConnection`].
#[derive(Debug)]
pub struct TcpWriter {
    write: OwnedWriteHalf,
}

#[async_trait]
impl InstructionWriter for TcpWriter {
    async fn write_instruction(
        &mut self,
        instruction: &Instruction,
    ) -> Result<(), TransportError> {
        self.write_raw(instruction.encode().as_bytes()).await
    }

    async fn write_raw(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.write
            .write_all(data)
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn connect_refused_is_connection_failed() {
        // Reserve a port, then close the listener so nothing is bound.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ConnectConfig::new("vnc");
        let err = connect("127.0.0.1", port, &config).await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed(_)));
    }

    #[tokio::test]
    async fn reads_instructions_across_segments() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            // Split one instruction across two writes.
            stream.write_all(b"4.sync,8.123").await.unwrap();
            stream.flush().await.unwrap();
            stream.write_all(b"45678;").await.unwrap();
            stream.shutdown().await.unwrap();
        });

        let config = ConnectConfig::new("vnc");
        let conn = connect("127.0.0.1", port, &config).await.unwrap();
        let (mut reader, _writer) = conn.split();

        let inst = reader.read_instruction().await.unwrap().unwrap();
        assert_eq!(inst.opcode, "sync");
        assert_eq!(inst.args, vec!["12345678"]);
        assert_eq!(reader.read_instruction().await.unwrap(), None);

        server.await.unwrap();
    }
}
