//! Disassembly engines and registry.
//!
//! Adapters for x86 (32 and 64 bit):
//! - iced-x86 (default)
//! - capstone, with semantic groups from instruction detail

pub mod capstone;
pub mod iced;
pub mod registry;

pub use registry::{for_arch, for_arch_with, Backend, BackendKind};
