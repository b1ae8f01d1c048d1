#![no_main]
use libfuzzer_sys::fuzz_target;
use lancelot::core::{Arch, Mode};
use lancelot::loader::{load_pe, pe_mode};
use lancelot::Workspace;

fuzz_target!(|data: &[u8]| {
    let Ok(mode) = pe_mode(data) else {
        return;
    };
    if let Ok(mut ws) = Workspace::new(Arch::X86, mode) {
        let _ = load_pe(&mut ws, "fuzz", data);
    }
});
