//! Error types returned by the KW1281 client.

use thiserror::Error;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A framing-level defect in a received block.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FramingError {
    /// The length byte was below the minimum block length of 3.
    #[error("block length {0} is below the minimum of 3")]
    LengthTooShort(u8),
    /// The inbound block counter did not match the expected value.
    #[error("counter out of sync: expected {expected}, got {actual}")]
    CounterMismatch {
        /// Counter value the session expected next.
        expected: u8,
        /// Counter value actually received.
        actual: u8,
    },
    /// The byte terminating a block was not `0x03`.
    #[error("missing end marker, got 0x{0:02x}")]
    MissingEndMarker(u8),
}

/// A defect found while decoding a measurement triplet or group.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The transform formula id has no known decoding.
    #[error("unknown transform formula id {0}")]
    UnknownFormula(u8),
    /// The measurement group id has no known metric mapping.
    #[error("unknown measurement group id {0}")]
    UnknownGroup(u8),
    /// A MeasurementGroup block did not carry exactly 9 data bytes.
    #[error("measurement group block carried {0} data bytes, expected 9")]
    WrongDataLength(usize),
}

/// Errors produced by the KW1281 client.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying serial port failed.
    #[error("serial port I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A byte echoed by the ECU (or its complement acknowledgement) did not
    /// match what was expected.
    #[error("echo mismatch: expected 0x{expected:02x}, got 0x{actual:02x}")]
    Echo {
        /// The byte value that was expected back.
        expected: u8,
        /// The byte value actually read.
        actual: u8,
    },

    /// A block was malformed.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// An unexpected block type or sequence occurred outside of decoding.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A measurement triplet or group could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The connection was closed more than once.
    #[error("connection already closed")]
    AlreadyClosed,
}
