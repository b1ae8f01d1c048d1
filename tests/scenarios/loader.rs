use std::process::Command;

use lancelot::analysis::LinearDisassembler;
use lancelot::core::{AddressSpace, Arch, Mode, VA};
use lancelot::loader::{load_file, load_pe, load_shellcode, pe::HEADERS_REGION_NAME};
use lancelot::{LancelotError, Workspace};

use crate::common::{
    create_temp_file, patch_u32, pe_image, IMAGE_BASE, PE32_SIZE_OF_IMAGE_OFFSET,
    PE32_TEXT_VIRTUAL_SIZE_OFFSET,
};

// push ebp; mov ebp, esp; call +0; jz +1; nop; pop ebp; ret
const CODE32: &[u8] = b"\x55\x89\xE5\xE8\x00\x00\x00\x00\x74\x01\x90\x5D\xC3";

#[test]
fn pe32_sections_are_mapped_at_preferred_base() {
    let image = pe_image(Mode::Bits32, CODE32);
    let mut ws = Workspace::new(Arch::X86, Mode::Bits32).unwrap();
    let module = load_pe(&mut ws, "test.exe", &image).unwrap();

    assert_eq!(module.base_address, VA(IMAGE_BASE));
    assert_eq!(module.entry_point, VA(IMAGE_BASE + 0x1000));
    assert_eq!(ws.modules(), &[module.clone()]);

    let regions = ws.list_regions();
    assert_eq!(regions[0].name, HEADERS_REGION_NAME);
    assert_eq!(regions[0].address, VA(IMAGE_BASE));
    let text = regions.iter().find(|r| r.name == ".text").unwrap();
    assert_eq!(text.address, VA(IMAGE_BASE + 0x1000));
    assert_eq!(text.length, 0x1000);

    assert_eq!(ws.read(VA(IMAGE_BASE), 2).unwrap(), b"MZ".to_vec());
    assert_eq!(
        ws.read(module.entry_point, CODE32.len() as u64).unwrap(),
        CODE32.to_vec()
    );
}

#[test]
fn explore_loaded_entry_point() {
    let image = pe_image(Mode::Bits32, CODE32);
    let mut ws = Workspace::new(Arch::X86, Mode::Bits32).unwrap();
    let module = load_pe(&mut ws, "test.exe", &image).unwrap();

    let mut ld = LinearDisassembler::new();
    let exploration = ld.explore_function(&ws, module.entry_point).unwrap();
    let base = IMAGE_BASE + 0x1000;
    let visited: Vec<u64> = exploration.visited.iter().map(|va| va.0 - base).collect();
    assert_eq!(visited, vec![0x0, 0x1, 0x3, 0x8, 0xa, 0xb, 0xc]);
    assert_eq!(exploration.edges, 2);
}

#[test]
fn section_larger_than_image_is_rejected() {
    let mut image = pe_image(Mode::Bits32, b"\xC3");
    patch_u32(&mut image, PE32_TEXT_VIRTUAL_SIZE_OFFSET, 0xF000_0000);

    let mut ws = Workspace::new(Arch::X86, Mode::Bits32).unwrap();
    assert!(matches!(
        load_pe(&mut ws, "big.exe", &image),
        Err(LancelotError::InvalidFormat(_))
    ));
    assert!(ws.list_regions().is_empty());
    assert!(ws.modules().is_empty());
}

#[test]
fn oversized_image_is_rejected() {
    let mut image = pe_image(Mode::Bits32, b"\xC3");
    patch_u32(&mut image, PE32_SIZE_OF_IMAGE_OFFSET, 0xF000_0000);
    patch_u32(&mut image, PE32_TEXT_VIRTUAL_SIZE_OFFSET, 0xE000_0000);

    let mut ws = Workspace::new(Arch::X86, Mode::Bits32).unwrap();
    assert!(matches!(
        load_pe(&mut ws, "big.exe", &image),
        Err(LancelotError::InvalidFormat(_))
    ));
    assert!(ws.list_regions().is_empty());
}

#[test]
fn pe64_requires_64bit_workspace() {
    let image = pe_image(Mode::Bits64, b"\x55\x48\x89\xE5\x5D\xC3");
    let mut ws = Workspace::new(Arch::X86, Mode::Bits32).unwrap();
    assert!(matches!(
        load_pe(&mut ws, "x64.exe", &image),
        Err(LancelotError::InvalidMode(_))
    ));

    let mut ws = Workspace::new(Arch::X86, Mode::Bits64).unwrap();
    let module = load_pe(&mut ws, "x64.exe", &image).unwrap();
    assert_eq!(module.entry_point, VA(IMAGE_BASE + 0x1000));
    assert_eq!(ws.decode_one(module.entry_point).unwrap().mnemonic, "push");
}

#[test]
fn load_file_names_module_after_file() {
    let file = create_temp_file(&pe_image(Mode::Bits32, CODE32));
    let mut ws = Workspace::new(Arch::X86, Mode::Bits32).unwrap();
    let module = load_file(&mut ws, file.path()).unwrap();
    let expected = file.path().file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(module.name, expected);

    let mut ws = Workspace::new(Arch::X86, Mode::Bits32).unwrap();
    assert!(matches!(
        load_file(&mut ws, "/nonexistent/input.exe"),
        Err(LancelotError::Io(_))
    ));
}

#[test]
fn shellcode_and_pe_coexist() {
    let mut ws = Workspace::new(Arch::X86, Mode::Bits32).unwrap();
    load_pe(&mut ws, "test.exe", &pe_image(Mode::Bits32, CODE32)).unwrap();
    load_shellcode(&mut ws, "sc", VA(0x10_0000), b"\x90\xC3").unwrap();
    assert_eq!(ws.modules().len(), 2);

    // overlapping the image is refused
    assert!(matches!(
        load_shellcode(&mut ws, "sc2", VA(IMAGE_BASE + 0x10), b"\xC3"),
        Err(LancelotError::Overlap { .. })
    ));
}

#[test]
fn cli_lists_function() {
    let file = create_temp_file(&pe_image(Mode::Bits32, CODE32));
    let output = Command::new(env!("CARGO_BIN_EXE_linear_disassembler"))
        .arg("--input_file")
        .arg(file.path())
        .arg("--fva")
        .arg(format!("{:x}", IMAGE_BASE + 0x1000))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0x401000: 55"));
    assert!(stdout.contains("--> call"));
    assert!(stdout.contains("0x401008 --> 0x40100b"));
}

#[test]
fn cli_json_report() {
    let file = create_temp_file(&pe_image(Mode::Bits32, CODE32));
    let output = Command::new(env!("CARGO_BIN_EXE_linear_disassembler"))
        .arg("--input_file")
        .arg(file.path())
        .arg("--fva")
        .arg("0x401000")
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["instructions"].as_array().unwrap().len(), 7);
    assert_eq!(report["edges"].as_array().unwrap().len(), 2);
    assert!(report["failures"].as_array().unwrap().is_empty());
}

#[test]
fn cli_rejects_missing_file() {
    let output = Command::new(env!("CARGO_BIN_EXE_linear_disassembler"))
        .args(["--input_file", "/nonexistent/input.exe", "--fva", "401000"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("must exist"));
}

#[test]
fn cli_rejects_bad_address() {
    let file = create_temp_file(&pe_image(Mode::Bits32, CODE32));
    let output = Command::new(env!("CARGO_BIN_EXE_linear_disassembler"))
        .arg("--input_file")
        .arg(file.path())
        .args(["--fva", "nothex"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
