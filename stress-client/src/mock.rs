//! Scriptable in-memory transport for tests.
//!
//! Allows queueing instructions for the reader and capturing everything
//! the writer emits.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stress_proto::Instruction;

use crate::{InstructionReader, InstructionWriter, TransportError};

#[derive(Debug, Default)]
struct MockInner {
    script: VecDeque<Instruction>,
    written_instructions: Vec<Instruction>,
    written_raw: Vec<Vec<u8>>,
    fail_next_read: Option<String>,
    fail_next_write: Option<String>,
}

/// In-memory connection whose reads are scripted and whose writes are
/// captured for inspection.
///
/// Reader and writer handles share state, so a test can hold the
/// connection while the code under test owns the halves:
///
/// ```
/// use guac_stress_client::MockConnection;
/// use stress_proto::Instruction;
///
/// let conn = MockConnection::new();
/// conn.queue_instruction(Instruction::new("nop", vec![]));
/// let (reader, writer) = (conn.reader(), conn.writer());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockConnection {
    inner: Arc<Mutex<MockInner>>,
}

impl MockConnection {
    /// Create an empty mock connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an instruction to be yielded by a later read. Once the queue
    /// is exhausted, reads report end of stream.
    pub fn queue_instruction(&self, instruction: Instruction) {
        self.inner.lock().unwrap().script.push_back(instruction);
    }

    /// Cause the next read to fail with the given error message.
    pub fn fail_next_read(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_read = Some(error.to_string());
    }

    /// Cause the next write (instruction or raw) to fail.
    pub fn fail_next_write(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_write = Some(error.to_string());
    }

    /// Number of scripted instructions not yet consumed.
    pub fn unread_count(&self) -> usize {
        self.inner.lock().unwrap().script.len()
    }

    /// All instructions written via `write_instruction`, in order.
    pub fn written_instructions(&self) -> Vec<Instruction> {
        self.inner.lock().unwrap().written_instructions.clone()
    }

    /// All chunks written via `write_raw`, in emission order.
    pub fn written_raw(&self) -> Vec<Vec<u8>> {
        self.inner.lock().unwrap().written_raw.clone()
    }

    /// Concatenation of all raw chunks.
    pub fn written_raw_bytes(&self) -> Vec<u8> {
        self.inner.lock().unwrap().written_raw.concat()
    }

    /// A reader handle over this connection's script.
    pub fn reader(&self) -> MockReader {
        MockReader {
            inner: Arc::clone(&self.inner),
        }
    }

    /// A writer handle capturing into this connection.
    pub fn writer(&self) -> MockWriter {
        MockWriter {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Reader handle for a [`MockConnection`].
#[derive(Debug)]
pub struct MockReader {
    inner: Arc<Mutex<MockInner>>,
}

#[async_trait]
impl InstructionReader for MockReader {
    async fn read_instruction(&mut self) -> Result<Option<Instruction>, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_read.take() {
            return Err(TransportError::Read(error));
        }
        Ok(inner.script.pop_front())
    }
}

/// Writer handle for a [`MockConnection`].
#[derive(Debug)]
pub struct MockWriter {
    inner: Arc<Mutex<MockInner>>,
}

#[async_trait]
impl InstructionWriter for MockWriter {
    async fn write_instruction(
        &mut self,
        instruction: &Instruction,
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_write.take() {
            return Err(TransportError::Write(error));
        }
        inner.written_instructions.push(instruction.clone());
        Ok(())
    }

    async fn write_raw(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_write.take() {
            return Err(TransportError::Write(error));
        }
        inner.written_raw.push(data.to_vec());
        Ok(())
    }
}
