//! Error types for NEXRAD decoding operations.

use thiserror::Error;

/// Result type for decoder operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised while decoding NEXRAD and AWIPS data.
///
/// Decoders never panic on malformed input; every structural problem maps to
/// one of these variants and the caller decides whether to skip, resync or stop.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The stream ended before a read could be satisfied
    #[error("Unexpected end of data at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A decoder consumed more bytes than the enclosing structure declared
    #[error("Consumed {consumed} bytes, exceeding declared size of {declared} bytes")]
    Overrun { consumed: usize, declared: usize },

    /// A seek landed outside the underlying buffer
    #[error("Invalid seek to offset {offset} (length {length})")]
    InvalidSeek { offset: usize, length: usize },

    /// Header bytes could not be interpreted
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// A field failed a range or consistency check
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// A Level II message type without a registered decoder
    #[error("Unknown message type: {0}")]
    UnknownMessageType(u8),

    /// A Level III packet code outside the supported set
    #[error("Unknown packet code: {0} (0x{0:04X})")]
    UnknownPacketCode(u16),

    /// A Level III message code that is not a graphic product
    #[error("Unsupported product message code: {0}")]
    UnsupportedProduct(i16),

    /// A multi-segment Level II message arrived out of order
    #[error("Segment {segment} of {total} out of sequence: {reason}")]
    SegmentSequence {
        segment: u16,
        total: u16,
        reason: String,
    },

    /// Data is compressed with a scheme this crate does not decode
    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(String),

    /// Compressed data could not be expanded
    #[error("Decompression error: {0}")]
    Decompression(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// Shorthand for a field validation failure.
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Returns true if the error was caused by running out of input.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}
