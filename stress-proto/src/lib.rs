//! # stress-proto
//!
//! Wire format types and streaming codec for the Guacamole protocol.
//!
//! The protocol is a stream of instructions, each a sequence of
//! length-prefixed elements:
//!
//! ```text
//! 4.sync,8.12345678;
//! ```
//!
//! Every element is `<decimal length>.<content>` followed by `,` (more
//! elements in this instruction) or `;` (instruction ends). Lengths count
//! Unicode code points, not bytes.
//!
//! This crate provides:
//! - [`Instruction`] - one decoded protocol message (opcode + arguments)
//! - [`InstructionParser`] - incremental parser safe to feed arbitrary
//!   chunk boundaries
//! - [`ProtoError`] - malformed wire data errors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod instruction;
mod parser;

pub use error::ProtoError;
pub use instruction::Instruction;
pub use parser::{InstructionParser, MAX_ELEMENT_LENGTH};
