//! AddressSpace abstraction and the default in-memory implementation.
//!
//! The `AddressSpace` trait is the minimal storage capability everything else
//! builds on: map, unmap, read, write and enumerate regions over a
//! byte-addressable space. Regions never overlap, and every access must be
//! fully contained in exactly one mapped region.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

use crate::core::address::VA;
use crate::error::{LancelotError, Result};

/// A named, contiguous range of mapped memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryRegion {
    /// Name used for bookkeeping and diagnostics (e.g. ".text", "stack")
    pub name: String,
    /// First address of the region
    pub address: VA,
    /// Size of the region in bytes (never zero)
    pub length: u64,
}

impl MemoryRegion {
    pub fn new(name: impl Into<String>, address: VA, length: u64) -> Self {
        Self {
            name: name.into(),
            address,
            length,
        }
    }

    /// Exclusive end address. Regions are validated on map so this cannot overflow
    /// for a mapped region; saturates otherwise.
    pub fn end(&self) -> u64 {
        self.address.0.saturating_add(self.length)
    }

    /// Check whether `va` falls inside `[address, address+length)`.
    pub fn contains(&self, va: VA) -> bool {
        va.0 >= self.address.0 && va.0 < self.end()
    }

    /// Check whether `[va, va+length)` is fully contained in this region.
    pub fn contains_range(&self, va: VA, length: u64) -> bool {
        match va.0.checked_add(length) {
            Some(end) => va.0 >= self.address.0 && end <= self.end(),
            None => false,
        }
    }

    /// Check whether two regions share at least one byte.
    pub fn overlaps(&self, address: VA, length: u64) -> bool {
        let end = address.0.saturating_add(length);
        address.0 < self.end() && self.address.0 < end
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:#x}-{:#x})",
            self.name,
            self.address.0,
            self.end()
        )
    }
}

/// Minimal capability set over a byte-addressable space.
pub trait AddressSpace {
    /// Map a new zero-filled region.
    ///
    /// Fails with `InvalidLength` if `length` is zero and `Overlap` if the
    /// range intersects an existing region.
    fn map(&mut self, address: VA, length: u64, name: &str) -> Result<()>;

    /// Remove the region exactly matching `[address, address+length)`.
    fn unmap(&mut self, address: VA, length: u64) -> Result<()>;

    /// Read `length` bytes starting at `address`.
    fn read(&self, address: VA, length: u64) -> Result<Vec<u8>>;

    /// Write `data` at `address`. Either the whole write is committed or nothing is.
    fn write(&mut self, address: VA, data: &[u8]) -> Result<()>;

    /// All current regions, in registration order.
    fn list_regions(&self) -> Vec<MemoryRegion>;

    /// The region containing `address`, if any.
    fn find_region(&self, address: VA) -> Option<MemoryRegion> {
        self.list_regions().into_iter().find(|r| r.contains(address))
    }

    /// Read a single byte.
    fn read_u8(&self, address: VA) -> Result<u8> {
        let b = self.read(address, 1)?;
        Ok(b[0])
    }

    /// Read a little-endian u16.
    fn read_u16(&self, address: VA) -> Result<u16> {
        let b = self.read(address, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a little-endian u32.
    fn read_u32(&self, address: VA) -> Result<u32> {
        let b = self.read(address, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a little-endian u64.
    fn read_u64(&self, address: VA) -> Result<u64> {
        let b = self.read(address, 8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }
}

#[derive(Debug, Clone)]
struct Mapping {
    region: MemoryRegion,
    data: Vec<u8>,
}

/// Address space backed by one heap buffer per mapped region.
#[derive(Debug, Clone, Default)]
pub struct SimpleAddressSpace {
    // registration order
    mappings: Vec<Mapping>,
}

impl SimpleAddressSpace {
    pub fn new() -> Self {
        Self::default()
    }

    fn containing(&self, address: VA, length: u64) -> Option<usize> {
        self.mappings
            .iter()
            .position(|m| m.region.contains_range(address, length))
    }
}

impl AddressSpace for SimpleAddressSpace {
    fn map(&mut self, address: VA, length: u64, name: &str) -> Result<()> {
        if length == 0 {
            return Err(LancelotError::InvalidLength { address });
        }
        if address.checked_add(length).is_none() {
            return Err(LancelotError::AddressOverflow {
                address,
                offset: length,
            });
        }
        let size = usize::try_from(length).map_err(|_| LancelotError::InvalidLength { address })?;

        if let Some(existing) = self
            .mappings
            .iter()
            .find(|m| m.region.overlaps(address, length))
        {
            return Err(LancelotError::Overlap {
                address,
                length,
                existing: existing.region.name.clone(),
            });
        }

        trace!(name, address = %address, length, "map region");
        self.mappings.push(Mapping {
            region: MemoryRegion::new(name, address, length),
            data: vec![0u8; size],
        });
        Ok(())
    }

    fn unmap(&mut self, address: VA, length: u64) -> Result<()> {
        let index = self
            .mappings
            .iter()
            .position(|m| m.region.address == address && m.region.length == length)
            .ok_or(LancelotError::NotMapped { address, length })?;
        let removed = self.mappings.remove(index);
        trace!(name = %removed.region.name, address = %address, length, "unmap region");
        Ok(())
    }

    fn read(&self, address: VA, length: u64) -> Result<Vec<u8>> {
        let index = self
            .containing(address, length)
            .ok_or(LancelotError::UnmappedRead { address, length })?;
        let m = &self.mappings[index];
        // contained, so both offsets fit the buffer
        let start = (address.0 - m.region.address.0) as usize;
        let end = start + length as usize;
        Ok(m.data[start..end].to_vec())
    }

    fn write(&mut self, address: VA, data: &[u8]) -> Result<()> {
        let length = data.len() as u64;
        let index = self
            .containing(address, length)
            .ok_or(LancelotError::UnmappedWrite { address, length })?;
        let m = &mut self.mappings[index];
        let start = (address.0 - m.region.address.0) as usize;
        m.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn list_regions(&self) -> Vec<MemoryRegion> {
        self.mappings.iter().map(|m| m.region.clone()).collect()
    }

    fn find_region(&self, address: VA) -> Option<MemoryRegion> {
        self.mappings
            .iter()
            .find(|m| m.region.contains(address))
            .map(|m| m.region.clone())
    }
}
