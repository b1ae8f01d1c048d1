//! Error types for the Lancelot workspace.
//!
//! This module provides structured error types using thiserror. Each
//! variant corresponds to one failure class of the address space, the
//! decoder, the exploration engine or the emulator bootstrap.

use thiserror::Error;

use crate::core::address::VA;

/// Main error type for Lancelot operations.
#[derive(Debug, Error)]
pub enum LancelotError {
    /// Architecture not supported by the workspace or decoder
    #[error("invalid arch provided: {0}")]
    InvalidArch(String),

    /// Mode (bit width) not supported by the workspace or decoder
    #[error("invalid mode provided: {0}")]
    InvalidMode(String),

    /// Mapping would intersect an existing region
    #[error("region {address}+{length:#x} overlaps existing region '{existing}'")]
    Overlap {
        address: VA,
        length: u64,
        existing: String,
    },

    /// Mapping with a zero length
    #[error("invalid length for region at {address}: must be non-zero")]
    InvalidLength { address: VA },

    /// Unmap of a range that is not exactly one mapped region
    #[error("no region mapped at {address}+{length:#x}")]
    NotMapped { address: VA, length: u64 },

    /// Read not fully contained in one mapped region
    #[error("unmapped read at {address}+{length:#x}")]
    UnmappedRead { address: VA, length: u64 },

    /// Write not fully contained in one mapped region
    #[error("unmapped write at {address}+{length:#x}")]
    UnmappedWrite { address: VA, length: u64 },

    /// The decode engine produced no instruction
    #[error("failed to decode instruction at {address}: {reason}")]
    Decode { address: VA, reason: String },

    /// Address arithmetic left the 64-bit space
    #[error("address overflow: {address} + {offset:#x}")]
    AddressOverflow { address: VA, offset: u64 },

    /// A registered trace handler failed and aborted the exploration
    #[error("trace handler failed at {va}: {source}")]
    Handler {
        va: VA,
        #[source]
        source: anyhow::Error,
    },

    /// Input file is not a supported executable format
    #[error("invalid binary format: {0}")]
    InvalidFormat(String),

    /// Configuration could not be parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LancelotError {
    /// Short, stable name of the error kind, suitable for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            LancelotError::InvalidArch(_) => "InvalidArchError",
            LancelotError::InvalidMode(_) => "InvalidModeError",
            LancelotError::Overlap { .. } => "OverlapError",
            LancelotError::InvalidLength { .. } => "InvalidLengthError",
            LancelotError::NotMapped { .. } => "NotMappedError",
            LancelotError::UnmappedRead { .. } => "UnmappedReadError",
            LancelotError::UnmappedWrite { .. } => "UnmappedWriteError",
            LancelotError::Decode { .. } => "DecodeError",
            LancelotError::AddressOverflow { .. } => "AddressOverflowError",
            LancelotError::Handler { .. } => "HandlerError",
            LancelotError::InvalidFormat(_) => "InvalidFormatError",
            LancelotError::Config(_) => "ConfigError",
            LancelotError::Io(_) => "IoError",
        }
    }
}

/// Result type alias for Lancelot operations
pub type Result<T> = std::result::Result<T, LancelotError>;
