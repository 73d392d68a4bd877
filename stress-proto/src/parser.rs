//! Incremental parser for the instruction stream.
//!
//! The parser is fed raw bytes in whatever chunks the transport happens to
//! deliver and yields complete [`Instruction`]s. Chunk boundaries may fall
//! anywhere, including inside a length prefix or in the middle of a
//! multi-byte UTF-8 sequence.

use std::collections::VecDeque;

use crate::{Instruction, ProtoError};

/// Maximum accepted element length, in code points.
///
/// Nothing in the protocol itself sends elements anywhere near this long;
/// the cap bounds memory held for a single element.
pub const MAX_ELEMENT_LENGTH: usize = 8192;

#[derive(Debug)]
enum ParseState {
    /// Accumulating the decimal length prefix of the next element.
    Length { value: usize, digits: bool },
    /// Collecting `remaining` more code points of element content.
    Content { remaining: usize, content: String },
    /// Content complete; expecting `,` or `;`.
    Terminator { content: String },
}

/// Incremental instruction stream parser.
///
/// ```
/// use guac_stress_proto::InstructionParser;
///
/// let mut parser = InstructionParser::new();
/// parser.feed(b"4.sync,8.123").unwrap();
/// assert!(parser.next_instruction().is_none());
/// parser.feed(b"45678;").unwrap();
/// let inst = parser.next_instruction().unwrap();
/// assert_eq!(inst.opcode, "sync");
/// ```
#[derive(Debug)]
pub struct InstructionParser {
    state: ParseState,
    elements: Vec<String>,
    ready: VecDeque<Instruction>,
    /// Trailing bytes of an incomplete UTF-8 sequence from the last chunk.
    partial: Vec<u8>,
    /// Bytes fully decoded so far, for error offsets.
    offset: usize,
}

impl Default for InstructionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionParser {
    /// Create a parser at the start of an instruction stream.
    pub fn new() -> Self {
        Self {
            state: ParseState::Length {
                value: 0,
                digits: false,
            },
            elements: Vec::new(),
            ready: VecDeque::new(),
            partial: Vec::new(),
            offset: 0,
        }
    }

    /// Feed a chunk of raw stream bytes.
    ///
    /// Completed instructions become available through
    /// [`next_instruction`](Self::next_instruction). A returned error is
    /// fatal for the stream; the parser must not be fed again afterwards.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), ProtoError> {
        let joined: Vec<u8>;
        let bytes: &[u8] = if self.partial.is_empty() {
            chunk
        } else {
            let mut data = std::mem::take(&mut self.partial);
            data.extend_from_slice(chunk);
            joined = data;
            &joined
        };

        match std::str::from_utf8(bytes) {
            Ok(text) => {
                self.process(text)?;
                self.offset += text.len();
                Ok(())
            }
            Err(e) => {
                let (valid, tail) = bytes.split_at(e.valid_up_to());
                let text = std::str::from_utf8(valid)
                    .map_err(|_| ProtoError::InvalidUtf8(self.offset))?;
                self.process(text)?;
                self.offset += valid.len();
                match e.error_len() {
                    // Incomplete sequence at the end of the chunk; keep the
                    // tail for the next feed.
                    None => {
                        self.partial = tail.to_vec();
                        Ok(())
                    }
                    Some(_) => Err(ProtoError::InvalidUtf8(self.offset)),
                }
            }
        }
    }

    /// Pop the next fully decoded instruction, if any.
    pub fn next_instruction(&mut self) -> Option<Instruction> {
        self.ready.pop_front()
    }

    fn process(&mut self, text: &str) -> Result<(), ProtoError> {
        for ch in text.chars() {
            self.push_char(ch)?;
        }
        Ok(())
    }

    fn push_char(&mut self, ch: char) -> Result<(), ProtoError> {
        match &mut self.state {
            ParseState::Length { value, digits } => {
                if let Some(d) = ch.to_digit(10) {
                    *digits = true;
                    *value = *value * 10 + d as usize;
                    if *value > MAX_ELEMENT_LENGTH {
                        return Err(ProtoError::ElementTooLong(*value));
                    }
                } else if ch == '.' && *digits {
                    let remaining = *value;
                    self.state = if remaining == 0 {
                        ParseState::Terminator {
                            content: String::new(),
                        }
                    } else {
                        ParseState::Content {
                            remaining,
                            content: String::with_capacity(remaining),
                        }
                    };
                } else {
                    return Err(ProtoError::InvalidLengthPrefix(ch));
                }
            }
            ParseState::Content { remaining, content } => {
                content.push(ch);
                *remaining -= 1;
                if *remaining == 0 {
                    let content = std::mem::take(content);
                    self.state = ParseState::Terminator { content };
                }
            }
            ParseState::Terminator { content } => {
                let element = std::mem::take(content);
                match ch {
                    ',' => {
                        self.elements.push(element);
                        self.state = ParseState::Length {
                            value: 0,
                            digits: false,
                        };
                    }
                    ';' => {
                        self.elements.push(element);
                        let mut parts = std::mem::take(&mut self.elements).into_iter();
                        let opcode = parts.next().unwrap_or_default();
                        self.ready.push_back(Instruction {
                            opcode,
                            args: parts.collect(),
                        });
                        self.state = ParseState::Length {
                            value: 0,
                            digits: false,
                        };
                    }
                    other => return Err(ProtoError::InvalidTerminator(other)),
                }
            }
        }
        Ok(())
    }
}
