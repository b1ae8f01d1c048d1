use crate::core::disassembler::Mode;

/// x86 general purpose register file.
///
/// 32-bit contexts use the low halves; writes through `set_pc`/`set_sp`
/// truncate accordingly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    pub rax: u64,
    pub rbx: u64,
    pub rcx: u64,
    pub rdx: u64,
    pub rsi: u64,
    pub rdi: u64,
    pub rbp: u64,
    pub rsp: u64,
    pub r8: u64,
    pub r9: u64,
    pub r10: u64,
    pub r11: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
    pub rip: u64,
}

fn truncate(mode: Mode, value: u64) -> u64 {
    match mode {
        Mode::Bits32 => value & 0xFFFF_FFFF,
        Mode::Bits64 => value,
    }
}

impl Registers {
    pub fn pc(&self, mode: Mode) -> u64 {
        truncate(mode, self.rip)
    }

    pub fn set_pc(&mut self, mode: Mode, value: u64) {
        self.rip = truncate(mode, value);
    }

    pub fn sp(&self, mode: Mode) -> u64 {
        truncate(mode, self.rsp)
    }

    pub fn set_sp(&mut self, mode: Mode, value: u64) {
        self.rsp = truncate(mode, value);
    }

    pub fn eax(&self) -> u64 {
        self.rax & 0xFFFF_FFFF
    }

    pub fn esp(&self) -> u64 {
        self.rsp & 0xFFFF_FFFF
    }
}
