//! Error types for the transpiler

use thiserror::Error;

/// Result type for transpiler operations
pub type TranspileResult<T> = Result<T, TranspileError>;

#[derive(Error, Debug)]
pub enum TranspileError {
    /// Codec input is not a hexadecimal number
    #[error("invalid hex value: {value:?}")]
    InvalidHex { value: String },

    /// `D` does not fit in a single byte
    #[error("test {block}: recovery id {value} does not fit in one byte")]
    RecoveryIdOutOfRange { block: usize, value: String },

    /// `D` is neither 27 nor 28 and strict mode is on
    #[error("test {block}: unsupported recovery id {value} (expected 27 or 28)")]
    UnsupportedRecoveryId { block: usize, value: u64 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
