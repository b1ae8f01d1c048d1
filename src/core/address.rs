//! Address types for binary analysis.
//!
//! This module provides the `VA` and `RVA` newtypes that serve as the
//! foundation for all location references in a workspace. A `VA` is an
//! absolute virtual address; an `RVA` is relative to a loaded module's base
//! and only becomes dereferenceable once resolved against that base.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{LancelotError, Result};

/// Absolute virtual address within a workspace's address space.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VA(pub u64);

/// Address relative to a loaded module's base address.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RVA(pub u64);

impl VA {
    /// Add an offset to this address, returning `None` on overflow.
    pub fn checked_add(self, offset: u64) -> Option<VA> {
        self.0.checked_add(offset).map(VA)
    }

    /// Add an offset to this address, failing with `AddressOverflow`.
    pub fn offset(self, offset: u64) -> Result<VA> {
        self.checked_add(offset)
            .ok_or(LancelotError::AddressOverflow {
                address: self,
                offset,
            })
    }

    /// Subtract an offset from this address, returning `None` on underflow.
    pub fn checked_sub(self, offset: u64) -> Option<VA> {
        self.0.checked_sub(offset).map(VA)
    }

    /// Convert to an RVA relative to `base`. Returns `None` when below `base`.
    pub fn to_rva(self, base: VA) -> Option<RVA> {
        self.0.checked_sub(base.0).map(RVA)
    }

    /// Parse a hexadecimal address, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<VA> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        u64::from_str_radix(digits, 16)
            .map(VA)
            .map_err(|e| LancelotError::Config(format!("invalid hex address '{}': {}", s, e)))
    }
}

impl RVA {
    /// Resolve this RVA against a module base, failing on overflow.
    pub fn to_va(self, base: VA) -> Result<VA> {
        base.offset(self.0)
    }

    /// Add an offset to this RVA, returning `None` on overflow.
    pub fn checked_add(self, offset: u64) -> Option<RVA> {
        self.0.checked_add(offset).map(RVA)
    }
}

impl From<u64> for VA {
    fn from(v: u64) -> Self {
        VA(v)
    }
}

impl From<VA> for u64 {
    fn from(va: VA) -> Self {
        va.0
    }
}

impl From<u64> for RVA {
    fn from(v: u64) -> Self {
        RVA(v)
    }
}

impl From<RVA> for u64 {
    fn from(rva: RVA) -> Self {
        rva.0
    }
}

impl FromStr for VA {
    type Err = LancelotError;

    fn from_str(s: &str) -> Result<Self> {
        VA::from_hex(s)
    }
}

impl fmt::Display for VA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for VA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::Display for RVA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rva:{:#x}", self.0)
    }
}
