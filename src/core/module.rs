//! Loaded module records.
//!
//! A `LoadedModule` is the descriptive record a loader registers with the
//! workspace once it has mapped the module's bytes. It does not own memory;
//! it only anchors RVAs to an absolute base.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::address::{RVA, VA};
use crate::error::Result;

/// A module placed into the workspace by a loader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadedModule {
    /// Module name, usually the file name
    pub name: String,
    /// Absolute address the module is based at
    pub base_address: VA,
    /// Absolute address of the module entry point
    pub entry_point: VA,
}

impl LoadedModule {
    pub fn new(name: impl Into<String>, base_address: VA, entry_point: VA) -> Self {
        Self {
            name: name.into(),
            base_address,
            entry_point,
        }
    }

    /// Resolve an RVA against this module's base.
    pub fn va(&self, rva: RVA) -> Result<VA> {
        rva.to_va(self.base_address)
    }

    /// Express an absolute address relative to this module, if it lies above the base.
    pub fn rva(&self, va: VA) -> Option<RVA> {
        va.to_rva(self.base_address)
    }
}

impl fmt::Display for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (base {}, entry {})",
            self.name, self.base_address, self.entry_point
        )
    }
}
