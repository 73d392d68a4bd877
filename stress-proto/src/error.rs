//! Error types for the wire codec.

use thiserror::Error;

/// Errors produced while decoding the instruction stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtoError {
    /// A length prefix contained a non-digit character.
    #[error("invalid character {0:?} in element length prefix")]
    InvalidLengthPrefix(char),

    /// A length prefix exceeded the maximum element length.
    #[error("element length {0} exceeds maximum of {max}", max = crate::parser::MAX_ELEMENT_LENGTH)]
    ElementTooLong(usize),

    /// An element was followed by something other than `,` or `;`.
    #[error("invalid element terminator {0:?}")]
    InvalidTerminator(char),

    /// The stream contained bytes that are not valid UTF-8.
    #[error("invalid UTF-8 at stream offset {0}")]
    InvalidUtf8(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtoError::InvalidTerminator('x');
        assert_eq!(err.to_string(), "invalid element terminator 'x'");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProtoError>();
    }
}
