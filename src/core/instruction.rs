//! Decoded instruction type.
//!
//! Instruction represents a single decoded machine instruction at a specific
//! address, carrying its length, text, and the control-flow classification
//! the exploration engine needs.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::address::VA;

bitflags! {
    /// Semantic groups of an instruction relevant to control flow.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct InstructionGroups: u8 {
        /// Transfers control to a callee and returns
        const CALL = 0b0000_0001;
        /// Jump or branch
        const JUMP = 0b0000_0010;
        /// Branch is taken only under a condition (set together with JUMP)
        const CONDITIONAL = 0b0000_0100;
        /// Return from procedure or interrupt
        const RETURN = 0b0000_1000;
        /// Software interrupt or system call
        const INTERRUPT = 0b0001_0000;
    }
}

/// Decoded instruction at a specific address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Address where this instruction starts
    pub address: VA,
    /// Length of the instruction in bytes
    pub length: u16,
    /// Raw bytes of the instruction
    pub bytes: Vec<u8>,
    /// Instruction mnemonic (e.g., "mov", "jmp")
    pub mnemonic: String,
    /// Operand text (e.g., "ebp,esp")
    pub op_str: String,
    /// Control-flow groups
    pub groups: InstructionGroups,
    /// Directly-encoded branch or call targets
    pub targets: Vec<VA>,
}

impl Instruction {
    pub fn is_call(&self) -> bool {
        self.groups.contains(InstructionGroups::CALL)
    }

    pub fn is_jump(&self) -> bool {
        self.groups.contains(InstructionGroups::JUMP)
    }

    pub fn is_conditional(&self) -> bool {
        self.groups
            .contains(InstructionGroups::JUMP | InstructionGroups::CONDITIONAL)
    }

    pub fn is_return(&self) -> bool {
        self.groups.contains(InstructionGroups::RETURN)
    }

    /// Jump that always transfers control (not conditional).
    pub fn is_unconditional_jump(&self) -> bool {
        self.is_jump() && !self.groups.contains(InstructionGroups::CONDITIONAL)
    }

    /// Whether execution may continue at `address + length`.
    ///
    /// Unconditional jumps and returns end the straight-line path; calls are
    /// assumed to return.
    pub fn does_fallthrough(&self) -> bool {
        !(self.is_unconditional_jump() || self.is_return())
    }

    /// Address of the next sequential instruction, if representable.
    pub fn fallthrough_address(&self) -> Option<VA> {
        self.address.checked_add(self.length as u64)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.op_str.is_empty() {
            write!(f, "{}: {}", self.address, self.mnemonic)
        } else {
            write!(f, "{}: {} {}", self.address, self.mnemonic, self.op_str)
        }
    }
}
