use lancelot::core::{AddressSpace, Arch, LoadedModule, Mode, RVA, VA};
use lancelot::disasm::for_arch;
use lancelot::{LancelotError, Workspace, WorkspaceConfig};

use crate::common::ws32;

#[test]
fn regions_never_overlap() {
    let mut ws = Workspace::new(Arch::X86, Mode::Bits32).unwrap();
    ws.map(VA(0x1000), 0x1000, "a").unwrap();
    ws.map(VA(0x3000), 0x1000, "b").unwrap();

    for (addr, len) in [(0x1800, 0x100), (0x0800, 0x1000), (0x1fff, 0x2), (0x0, 0x10000)] {
        match ws.map(VA(addr), len, "c") {
            Err(LancelotError::Overlap { .. }) => {}
            other => panic!("{:#x}+{:#x}: expected overlap, got {:?}", addr, len, other),
        }
    }
    // adjacent is fine
    ws.map(VA(0x2000), 0x1000, "between").unwrap();

    let names: Vec<String> = ws.list_regions().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["a", "b", "between"]);
}

#[test]
fn round_trip_and_unmapped_access() {
    let mut ws = Workspace::new(Arch::X86, Mode::Bits32).unwrap();
    ws.map(VA(0x1000), 0x100, "a").unwrap();
    ws.write(VA(0x1010), b"hello").unwrap();
    assert_eq!(ws.read(VA(0x1010), 5).unwrap(), b"hello".to_vec());

    assert!(matches!(
        ws.read(VA(0x2000), 1),
        Err(LancelotError::UnmappedRead { .. })
    ));
    assert!(matches!(
        ws.write(VA(0x10fe), b"abc"),
        Err(LancelotError::UnmappedWrite { .. })
    ));
    // the failed write left the region untouched
    assert_eq!(ws.read(VA(0x10fe), 2).unwrap(), vec![0, 0]);
}

#[test]
fn unmap_requires_exact_range() {
    let mut ws = Workspace::new(Arch::X86, Mode::Bits32).unwrap();
    ws.map(VA(0x1000), 0x1000, "a").unwrap();
    assert!(matches!(
        ws.unmap(VA(0x1000), 0x800),
        Err(LancelotError::NotMapped { .. })
    ));
    ws.unmap(VA(0x1000), 0x1000).unwrap();
    assert!(ws.list_regions().is_empty());
    assert!(ws.read(VA(0x1000), 1).is_err());
}

#[test]
fn module_relative_pointer_reads() {
    let mut ws32 = Workspace::new(Arch::X86, Mode::Bits32).unwrap();
    ws32.map(VA(0x40_0000), 0x1000, "headers").unwrap();
    ws32.write(VA(0x40_0010), &[0x78, 0x56, 0x34, 0x12, 0xff, 0xff, 0xff, 0xff])
        .unwrap();
    let m = LoadedModule::new("a.exe", VA(0x40_0000), VA(0x40_1000));
    ws32.add_loaded_module(m.clone());
    assert_eq!(ws32.read_pointer_relative(&m, RVA(0x10)).unwrap(), VA(0x1234_5678));

    let mut ws64 = Workspace::new(Arch::X86, Mode::Bits64).unwrap();
    ws64.map(VA(0x40_0000), 0x1000, "headers").unwrap();
    ws64.write(VA(0x40_0010), &[0x78, 0x56, 0x34, 0x12, 0xff, 0xff, 0xff, 0xff])
        .unwrap();
    assert_eq!(
        ws64.read_pointer_relative(&m, RVA(0x10)).unwrap(),
        VA(0xffff_ffff_1234_5678)
    );
    assert!(ws64.modules().is_empty());
    assert_eq!(ws32.module_by_name("a.exe"), Some(&m));
}

#[test]
fn decode_is_deterministic() {
    let ws = ws32(b"\x55\x89\xE5\xE8\x00\x00\x00\x00\xC3");
    for va in [0x1000, 0x1001, 0x1003, 0x1008] {
        let a = ws.decode_one(VA(va)).unwrap();
        let b = ws.decode_one(VA(va)).unwrap();
        assert_eq!(a, b);
        assert_eq!(ws.instruction_length(VA(va)).unwrap(), a.length as u64);
    }
    assert_eq!(ws.instruction_length(VA(0x1003)).unwrap(), 5);
}

#[test]
fn decode_unmapped_is_decode_error() {
    let ws = ws32(b"\xC3");
    let err = ws.decode_one(VA(0x8000)).unwrap_err();
    assert_eq!(err.kind(), "DecodeError");
}

#[test]
fn unsupported_configuration_is_rejected() {
    let bad_arch = WorkspaceConfig::new("arm", "32");
    assert!(matches!(
        Workspace::from_config(&bad_arch),
        Err(LancelotError::InvalidArch(_))
    ));
    let bad_mode = WorkspaceConfig::new("x86", "16");
    assert!(matches!(
        Workspace::from_config(&bad_mode),
        Err(LancelotError::InvalidMode(_))
    ));
}

#[test]
fn injected_engine_must_match() {
    let engine = for_arch(Arch::X86, Mode::Bits64).unwrap();
    assert!(matches!(
        Workspace::with_disassembler(Arch::X86, Mode::Bits32, Box::new(engine)),
        Err(LancelotError::InvalidMode(_))
    ));

    let engine = for_arch(Arch::X86, Mode::Bits32).unwrap();
    let ws = Workspace::with_disassembler(Arch::X86, Mode::Bits32, Box::new(engine)).unwrap();
    assert_eq!(ws.disassembler().name(), "iced-x86");
}
