//! Lancelot: a binary-analysis workspace.
//!
//! Loads executable images into a modeled virtual address space, explores
//! code by following direct control flow from an entry point, and mirrors
//! the modeled memory into an emulator context for later execution.

/// Core data types module
pub mod core;

/// Decode engine adapters
pub mod disasm;

/// Analysis passes: linear exploration and listing
pub mod analysis;

pub mod config;
pub mod emu;
pub mod error;
pub mod loader;
pub mod logging;
pub mod workspace;

pub use config::WorkspaceConfig;
pub use crate::core::{AddressSpace, Arch, Instruction, LoadedModule, MemoryRegion, Mode, RVA, VA};
pub use emu::Emulator;
pub use error::{LancelotError, Result};
pub use workspace::Workspace;
