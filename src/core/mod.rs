//! Core data types for Lancelot.
//!
//! This module contains the fundamental types used throughout the system:
//! addresses, the address space abstraction, loaded module records, decoded
//! instructions and the disassembler interface.

pub mod address;
pub mod address_space;
pub mod disassembler;
pub mod instruction;
pub mod module;

pub use address::{RVA, VA};
pub use address_space::{AddressSpace, MemoryRegion, SimpleAddressSpace};
pub use disassembler::{Arch, Disassembler, DisassemblerError, DisassemblerResult, Mode};
pub use instruction::{Instruction, InstructionGroups};
pub use module::LoadedModule;
