#![no_main]
use libfuzzer_sys::fuzz_target;
use lancelot::analysis::LinearDisassembler;
use lancelot::core::{AddressSpace, Arch, Mode, VA};
use lancelot::Workspace;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let mode = if data[0] & 1 == 0 { Mode::Bits32 } else { Mode::Bits64 };
    let Ok(mut ws) = Workspace::new(Arch::X86, mode) else {
        return;
    };
    if ws.map(VA(0x1000), data.len() as u64, "fuzz").is_err() || ws.write(VA(0x1000), data).is_err() {
        return;
    }
    let mut ld = LinearDisassembler::new();
    if let Ok(exploration) = ld.explore_function(&ws, VA(0x1000)) {
        assert!(exploration.visited.len() <= data.len());
    }
});
