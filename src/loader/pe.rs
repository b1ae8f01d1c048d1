//! PE image loader.
//!
//! Maps the image headers and each section at its preferred virtual address
//! and registers the image as a `LoadedModule`. No relocation or import
//! processing is done; the image is placed at its preferred base.

use object::read::pe::{ImageNtHeaders, ImageOptionalHeader, PeFile32, PeFile64};
use object::read::{Object, ObjectSection};
use object::{Architecture, BinaryFormat};
use tracing::debug;

use crate::core::address::VA;
use crate::core::address_space::AddressSpace;
use crate::core::disassembler::Mode;
use crate::core::module::LoadedModule;
use crate::error::{LancelotError, Result};
use crate::workspace::Workspace;

/// Section regions are rounded up to this granularity.
pub const PAGE_SIZE: u64 = 0x1000;

/// Name of the region holding the image headers.
pub const HEADERS_REGION_NAME: &str = "headers";

/// Largest SizeOfImage accepted; the whole image is backed eagerly.
pub const MAX_IMAGE_SIZE: u64 = 0x1000_0000;

fn align_up(value: u64, alignment: u64) -> Option<u64> {
    value
        .checked_add(alignment - 1)
        .map(|v| v & !(alignment - 1))
}

struct SectionPlan<'data> {
    name: String,
    address: u64,
    length: u64,
    data: &'data [u8],
}

/// Mode a PE image must be analyzed in, derived from its machine type.
pub fn pe_mode(data: &[u8]) -> Result<Mode> {
    let obj = object::read::File::parse(data).map_err(|e| LancelotError::InvalidFormat(e.to_string()))?;
    if obj.format() != BinaryFormat::Pe {
        return Err(LancelotError::InvalidFormat(format!(
            "expected a PE image, found {:?}",
            obj.format()
        )));
    }
    match obj.architecture() {
        Architecture::I386 => Ok(Mode::Bits32),
        Architecture::X86_64 => Ok(Mode::Bits64),
        other => Err(LancelotError::InvalidArch(format!("{:?}", other))),
    }
}

/// SizeOfImage from the optional header.
fn size_of_image(data: &[u8], mode: Mode) -> Result<u64> {
    let size = match mode {
        Mode::Bits32 => PeFile32::parse(data).map(|pe| pe.nt_headers().optional_header().size_of_image()),
        Mode::Bits64 => PeFile64::parse(data).map(|pe| pe.nt_headers().optional_header().size_of_image()),
    }
    .map_err(|e| LancelotError::InvalidFormat(e.to_string()))?;
    Ok(u64::from(size))
}

/// Load the PE image `data` into `ws` under the module name `name`.
pub fn load_pe(ws: &mut Workspace, name: &str, data: &[u8]) -> Result<LoadedModule> {
    let mode = pe_mode(data)?;
    if mode != ws.mode() {
        return Err(LancelotError::InvalidMode(format!(
            "{}-bit image in a {}-bit workspace",
            mode.bits(),
            ws.mode().bits()
        )));
    }
    let obj = object::read::File::parse(data).map_err(|e| LancelotError::InvalidFormat(e.to_string()))?;

    let base = obj.relative_address_base();
    let entry = obj.entry();

    let image_size = size_of_image(data, mode)?;
    if image_size > MAX_IMAGE_SIZE {
        return Err(LancelotError::InvalidFormat(format!(
            "SizeOfImage {:#x} exceeds {:#x}",
            image_size, MAX_IMAGE_SIZE
        )));
    }
    let image_end = base.checked_add(image_size).ok_or(LancelotError::AddressOverflow {
        address: VA(base),
        offset: image_size,
    })?;

    let mut plans = Vec::new();
    for (i, section) in obj.sections().enumerate() {
        let section_data = section
            .data()
            .map_err(|e| LancelotError::InvalidFormat(e.to_string()))?;
        let size = section.size().max(section_data.len() as u64);
        if size == 0 {
            continue;
        }
        let address = section.address();
        let fits = address >= base && address.checked_add(size).is_some_and(|end| end <= image_end);
        if !fits {
            return Err(LancelotError::InvalidFormat(format!(
                "section {} at {}+{:#x} lies outside the image [{}-{})",
                i,
                VA(address),
                size,
                VA(base),
                VA(image_end)
            )));
        }
        // page alignment never reaches past the end of the image
        let length = align_up(size, PAGE_SIZE)
            .ok_or(LancelotError::AddressOverflow {
                address: VA(address),
                offset: size,
            })?
            .min(image_end - address);
        let section_name = match section.name() {
            Ok(n) if !n.is_empty() => n.to_string(),
            _ => format!("section{}", i),
        };
        plans.push(SectionPlan {
            name: section_name,
            address,
            length,
            data: section_data,
        });
    }
    plans.sort_by_key(|p| p.address);

    // regions may not overlap: each one stops where the next begins
    for i in 0..plans.len().saturating_sub(1) {
        let next = plans[i + 1].address;
        let end = plans[i].address.saturating_add(plans[i].length);
        if end > next {
            plans[i].length = next.saturating_sub(plans[i].address);
        }
    }

    let headers_len = plans
        .first()
        .map(|p| p.address.saturating_sub(base))
        .unwrap_or(PAGE_SIZE)
        .min(PAGE_SIZE);
    if headers_len > 0 {
        ws.map(VA(base), headers_len, HEADERS_REGION_NAME)?;
        let n = (headers_len as usize).min(data.len());
        ws.write(VA(base), &data[..n])?;
    }

    for plan in plans.iter().filter(|p| p.length > 0) {
        debug!(section = %plan.name, address = %VA(plan.address), length = plan.length, "pe: map section");
        ws.map(VA(plan.address), plan.length, &plan.name)?;
        let n = (plan.length as usize).min(plan.data.len());
        ws.write(VA(plan.address), &plan.data[..n])?;
    }

    let module = LoadedModule::new(name, VA(base), VA(entry));
    ws.add_loaded_module(module.clone());
    Ok(module)
}
