//! Disassembler trait and error types for instruction decoding.
//!
//! This module defines the Disassembler trait that provides a common interface
//! for different disassembler backends (iced-x86, Capstone, test doubles).
//! It also includes the architecture and mode tags a workspace is built with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::address::VA;
use crate::core::instruction::Instruction;
use crate::error::LancelotError;

/// Errors that can occur during disassembly operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisassemblerError {
    /// Invalid instruction bytes
    InvalidInstruction(),
    /// Insufficient bytes for complete instruction
    InsufficientBytes(),
    /// Unsupported architecture or mode for the selected backend
    UnsupportedArchitecture(),
    /// Internal disassembler error with message
    InternalError(String),
}

impl fmt::Display for DisassemblerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisassemblerError::InvalidInstruction() => write!(f, "InvalidInstruction"),
            DisassemblerError::InsufficientBytes() => write!(f, "InsufficientBytes"),
            DisassemblerError::UnsupportedArchitecture() => write!(f, "UnsupportedArchitecture"),
            DisassemblerError::InternalError(msg) => write!(f, "InternalError: {}", msg),
        }
    }
}

impl std::error::Error for DisassemblerError {}

/// Result type for disassembly operations
pub type DisassemblerResult<T> = Result<T, DisassemblerError>;

/// Instruction set architecture of a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    /// Intel x86 family
    X86,
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::X86 => write!(f, "x86"),
        }
    }
}

impl FromStr for Arch {
    type Err = LancelotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x86" => Ok(Arch::X86),
            _ => Err(LancelotError::InvalidArch(s.to_string())),
        }
    }
}

/// Bit width the architecture is decoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// 32-bit (protected mode)
    Bits32,
    /// 64-bit (long mode)
    Bits64,
}

impl Mode {
    /// Address size in bits
    pub fn bits(&self) -> u32 {
        match self {
            Mode::Bits32 => 32,
            Mode::Bits64 => 64,
        }
    }

    /// Size of a pointer in bytes
    pub fn pointer_size(&self) -> u64 {
        match self {
            Mode::Bits32 => 4,
            Mode::Bits64 => 8,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl FromStr for Mode {
    type Err = LancelotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "32" => Ok(Mode::Bits32),
            "64" => Ok(Mode::Bits64),
            _ => Err(LancelotError::InvalidMode(s.to_string())),
        }
    }
}

/// Core disassembler trait that provides a common interface for instruction decoding.
///
/// Decoding must be a pure function of `(address, bytes)`.
pub trait Disassembler {
    /// Disassemble a single instruction anchored at `address`.
    fn disassemble_instruction(&self, address: VA, bytes: &[u8])
        -> DisassemblerResult<Instruction>;

    /// Disassemble up to `max_count` consecutive instructions from `bytes`.
    ///
    /// Stops at the first undecodable instruction or when the buffer is
    /// exhausted; may return zero instructions.
    fn disassemble(&self, address: VA, bytes: &[u8], max_count: usize) -> Vec<Instruction> {
        let mut out = Vec::new();
        let mut offset = 0usize;
        while out.len() < max_count && offset < bytes.len() {
            let va = match address.checked_add(offset as u64) {
                Some(va) => va,
                None => break,
            };
            match self.disassemble_instruction(va, &bytes[offset..]) {
                Ok(insn) => {
                    offset += insn.length as usize;
                    out.push(insn);
                }
                Err(_) => break,
            }
        }
        out
    }

    /// Maximum instruction length for this architecture in bytes
    fn max_instruction_length(&self) -> usize;

    /// Architecture this disassembler decodes
    fn arch(&self) -> Arch;

    /// Mode this disassembler decodes in
    fn mode(&self) -> Mode;

    /// Human-readable name for this disassembler
    fn name(&self) -> &str {
        "Generic Disassembler"
    }
}
