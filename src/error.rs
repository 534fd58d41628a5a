//! Decode errors

use thiserror::Error;

use crate::tlv::Tag;

/// Error returned by the stateless value decoders
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("empty value")]
    Empty,
    #[error("integer does not fit in 64 bits ({0} octets)")]
    IntegerTooLong(usize),
    #[error("invalid boolean encoding")]
    InvalidBoolean,
    #[error("invalid bit string: {0}")]
    InvalidBitString(&'static str),
    #[error("not a valid UTF-8 string")]
    InvalidUtf8,
    #[error("invalid KerberosTime: {0}")]
    InvalidTime(&'static str),
}

/// Error returned by the decoder engine
///
/// Only [`DecodeError::TruncatedInput`] is retryable: feed more bytes and
/// call the decoder again with the same container. Everything else aborts
/// the decode of the current message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated input at offset {offset}: {needed} more byte(s) needed")]
    TruncatedInput { offset: usize, needed: usize },

    #[error("invalid tag encoding at offset {offset}")]
    InvalidTagEncoding { offset: usize },

    #[error("invalid length encoding at offset {offset}")]
    InvalidLengthEncoding { offset: usize },

    #[error("length {length} at offset {offset} exceeds limit {limit}")]
    LengthOverflow {
        offset: usize,
        length: usize,
        limit: usize,
    },

    #[error("unexpected tag {tag} in {grammar} state {state} at offset {offset}")]
    UnexpectedTag {
        grammar: &'static str,
        state: String,
        tag: Tag,
        offset: usize,
    },

    #[error("length mismatch at offset {offset}: declared {declared}, available {available}")]
    LengthMismatch {
        offset: usize,
        declared: usize,
        available: usize,
    },

    #[error("zero-length value at offset {offset}")]
    ZeroLengthViolation { offset: usize },

    #[error("value {value} at offset {offset} out of range {min}..={max}")]
    ValueOutOfRange {
        offset: usize,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("invalid value at offset {offset}: {source}")]
    InvalidValue {
        offset: usize,
        #[source]
        source: ValueError,
    },

    #[error("{grammar} ended in state {state}")]
    PrematureEnd { grammar: &'static str, state: String },
}

impl DecodeError {
    /// True if the input ended early and the decode may be retried with more bytes
    pub fn is_truncated(&self) -> bool {
        matches!(self, DecodeError::TruncatedInput { .. })
    }

    /// Offset of the offending TLV, when the error has one
    pub fn offset(&self) -> Option<usize> {
        match *self {
            DecodeError::TruncatedInput { offset, .. }
            | DecodeError::InvalidTagEncoding { offset }
            | DecodeError::InvalidLengthEncoding { offset }
            | DecodeError::LengthOverflow { offset, .. }
            | DecodeError::UnexpectedTag { offset, .. }
            | DecodeError::LengthMismatch { offset, .. }
            | DecodeError::ZeroLengthViolation { offset }
            | DecodeError::ValueOutOfRange { offset, .. }
            | DecodeError::InvalidValue { offset, .. } => Some(offset),
            DecodeError::PrematureEnd { .. } => None,
        }
    }

    /// Shift offsets of an error raised by a nested decode into the parent's coordinates
    pub(crate) fn rebase(mut self, base: usize) -> Self {
        match &mut self {
            DecodeError::TruncatedInput { offset, .. }
            | DecodeError::InvalidTagEncoding { offset }
            | DecodeError::InvalidLengthEncoding { offset }
            | DecodeError::LengthOverflow { offset, .. }
            | DecodeError::UnexpectedTag { offset, .. }
            | DecodeError::LengthMismatch { offset, .. }
            | DecodeError::ZeroLengthViolation { offset }
            | DecodeError::ValueOutOfRange { offset, .. }
            | DecodeError::InvalidValue { offset, .. } => *offset += base,
            DecodeError::PrematureEnd { .. } => (),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebase_shifts_offsets() {
        let e = DecodeError::ZeroLengthViolation { offset: 3 }.rebase(10);
        assert_eq!(e.offset(), Some(13));
        let e = DecodeError::PrematureEnd {
            grammar: "HostAddress",
            state: "Start".to_owned(),
        }
        .rebase(10);
        assert_eq!(e.offset(), None);
    }

    #[test]
    fn only_truncation_is_retryable() {
        assert!(DecodeError::TruncatedInput { offset: 0, needed: 1 }.is_truncated());
        assert!(!DecodeError::InvalidTagEncoding { offset: 0 }.is_truncated());
    }
}
