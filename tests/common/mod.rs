//! Common test utilities and helpers.
//!
//! Builders for small workspaces and minimal PE images, so integration tests
//! do not depend on sample binaries being present.

#![allow(dead_code)]

use std::io::Write;

use lancelot::core::{AddressSpace, Arch, Mode, VA};
use lancelot::Workspace;
use tempfile::NamedTempFile;

/// Address test code snippets are mapped at.
pub const CODE_BASE: u64 = 0x1000;

/// Preferred image base of the generated PE images.
pub const IMAGE_BASE: u64 = 0x40_0000;

/// Build a workspace with one `.text` region of 0x1000 bytes at `CODE_BASE`
/// holding `code`.
pub fn workspace_with_code(mode: Mode, code: &[u8]) -> Workspace {
    let mut ws = Workspace::new(Arch::X86, mode).unwrap();
    ws.map(VA(CODE_BASE), 0x1000, ".text").unwrap();
    ws.write(VA(CODE_BASE), code).unwrap();
    ws
}

/// 32-bit workspace with `code` at `CODE_BASE`.
pub fn ws32(code: &[u8]) -> Workspace {
    workspace_with_code(Mode::Bits32, code)
}

/// Creates a temporary file with the given content.
pub fn create_temp_file(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file
}

/// Offset of SizeOfImage in a 32-bit image from `pe_image`.
pub const PE32_SIZE_OF_IMAGE_OFFSET: usize = 0x58 + 56;

/// Offset of the `.text` VirtualSize in a 32-bit image from `pe_image`.
pub const PE32_TEXT_VIRTUAL_SIZE_OFFSET: usize = 0x58 + 0xE0 + 8;

/// Overwrite a little-endian u32 header field.
pub fn patch_u32(image: &mut [u8], offset: usize, value: u32) {
    put_u32(image, offset, value);
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

fn align(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

/// Minimal PE image with a single `.text` section at RVA 0x1000 holding
/// `code`; the entry point is the first byte of `.text`.
pub fn pe_image(mode: Mode, code: &[u8]) -> Vec<u8> {
    const HEADERS_SIZE: usize = 0x200;
    let bits64 = mode == Mode::Bits64;
    let raw_size = align(code.len().max(1), 0x200);
    let mut out = vec![0u8; HEADERS_SIZE + raw_size];

    // DOS header
    out[0..2].copy_from_slice(b"MZ");
    put_u32(&mut out, 0x3c, 0x40);

    out[0x40..0x44].copy_from_slice(b"PE\0\0");

    // COFF file header
    let coff = 0x44;
    put_u16(&mut out, coff, if bits64 { 0x8664 } else { 0x014c });
    put_u16(&mut out, coff + 2, 1);
    let opt_size: usize = if bits64 { 0xF0 } else { 0xE0 };
    put_u16(&mut out, coff + 16, opt_size as u16);
    put_u16(&mut out, coff + 18, if bits64 { 0x0022 } else { 0x0102 });

    // optional header
    let opt = coff + 20;
    put_u16(&mut out, opt, if bits64 { 0x20b } else { 0x10b });
    put_u32(&mut out, opt + 4, raw_size as u32);
    put_u32(&mut out, opt + 16, 0x1000);
    put_u32(&mut out, opt + 20, 0x1000);
    if bits64 {
        put_u64(&mut out, opt + 24, IMAGE_BASE);
    } else {
        put_u32(&mut out, opt + 24, 0x2000);
        put_u32(&mut out, opt + 28, IMAGE_BASE as u32);
    }
    put_u32(&mut out, opt + 32, 0x1000);
    put_u32(&mut out, opt + 36, 0x200);
    put_u16(&mut out, opt + 40, 4);
    put_u16(&mut out, opt + 48, 4);
    put_u32(&mut out, opt + 56, (0x1000 + align(code.len().max(1), 0x1000)) as u32);
    put_u32(&mut out, opt + 60, HEADERS_SIZE as u32);
    put_u16(&mut out, opt + 68, 3);
    put_u32(&mut out, opt + if bits64 { 108 } else { 92 }, 16);

    // section table
    let sec = opt + opt_size;
    out[sec..sec + 5].copy_from_slice(b".text");
    put_u32(&mut out, sec + 8, code.len() as u32);
    put_u32(&mut out, sec + 12, 0x1000);
    put_u32(&mut out, sec + 16, raw_size as u32);
    put_u32(&mut out, sec + 20, HEADERS_SIZE as u32);
    put_u32(&mut out, sec + 36, 0x6000_0020);

    out[HEADERS_SIZE..HEADERS_SIZE + code.len()].copy_from_slice(code);
    out
}
