//! Code analysis passes over a `Workspace`.
//!
//! `linear` discovers reachable instructions by following direct control
//! flow; `format` renders decoded instructions for listings.

pub mod format;
pub mod linear;

pub use format::{format_address_disassembly, format_instruction};
pub use linear::{
    Exploration, InstructionTraceHandler, JumpKind, JumpTarget, JumpTraceHandler, LinearDisassembler,
};
