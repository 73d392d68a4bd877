//! Protocol instructions.

/// One decoded Guacamole protocol instruction: an opcode plus an ordered
/// list of argument strings.
///
/// Instructions are produced by [`InstructionParser`](crate::InstructionParser)
/// on the read side and encoded with [`encode`](Instruction::encode) on the
/// write side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The instruction opcode (e.g. `sync`, `error`, `blob`).
    pub opcode: String,
    /// The instruction arguments, in wire order.
    pub args: Vec<String>,
}

impl Instruction {
    /// Create an instruction from an opcode and arguments.
    pub fn new(opcode: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            opcode: opcode.into(),
            args,
        }
    }

    /// Encode to the exact wire form.
    ///
    /// Element lengths count Unicode code points, per the protocol, so
    /// `é` contributes 1 to the length prefix even though it occupies two
    /// bytes on the wire.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        push_element(&mut out, &self.opcode);
        for arg in &self.args {
            out.push(',');
            push_element(&mut out, arg);
        }
        out.push(';');
        out
    }
}

fn push_element(out: &mut String, element: &str) {
    out.push_str(&element.chars().count().to_string());
    out.push('.');
    out.push_str(element);
}
