use serde::{Deserialize, Serialize};

use crate::core::address::VA;
use crate::core::disassembler::{Arch, Disassembler, DisassemblerResult, Mode};
use crate::core::instruction::Instruction;

pub enum Backend {
    Iced(super::iced::IcedDisassembler),
    Cap(super::capstone::CapstoneDisassembler),
}

impl Disassembler for Backend {
    fn disassemble_instruction(&self, address: VA, bytes: &[u8]) -> DisassemblerResult<Instruction> {
        match self {
            Backend::Iced(d) => d.disassemble_instruction(address, bytes),
            Backend::Cap(d) => d.disassemble_instruction(address, bytes),
        }
    }

    fn max_instruction_length(&self) -> usize {
        match self {
            Backend::Iced(d) => d.max_instruction_length(),
            Backend::Cap(d) => d.max_instruction_length(),
        }
    }

    fn arch(&self) -> Arch {
        match self {
            Backend::Iced(d) => d.arch(),
            Backend::Cap(d) => d.arch(),
        }
    }

    fn mode(&self) -> Mode {
        match self {
            Backend::Iced(d) => d.mode(),
            Backend::Cap(d) => d.mode(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Backend::Iced(d) => d.name(),
            Backend::Cap(d) => d.name(),
        }
    }
}

/// Preferred backend kind for explicit selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Iced,
    Capstone,
}

/// Select the default disassembler backend for the given architecture.
pub fn for_arch(arch: Arch, mode: Mode) -> DisassemblerResult<Backend> {
    for_arch_with(arch, mode, None)
}

/// Explicit backend selector. Returns an error if the backend cannot be created.
pub fn for_arch_with(
    arch: Arch,
    mode: Mode,
    prefer: Option<BackendKind>,
) -> DisassemblerResult<Backend> {
    match (arch, prefer.unwrap_or_default()) {
        (Arch::X86, BackendKind::Iced) => Ok(Backend::Iced(super::iced::IcedDisassembler::new(mode))),
        (Arch::X86, BackendKind::Capstone) => {
            super::capstone::CapstoneDisassembler::new(mode).map(Backend::Cap)
        }
    }
}
