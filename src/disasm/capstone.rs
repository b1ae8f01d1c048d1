use capstone::arch::x86::{ArchMode, X86OperandType};
use capstone::prelude::*;
use capstone::Capstone;

use crate::core::address::VA;
use crate::core::disassembler::{Arch, Disassembler, DisassemblerError, DisassemblerResult, Mode};
use crate::core::instruction::{Instruction, InstructionGroups};

pub struct CapstoneDisassembler {
    cs: Capstone,
    mode: Mode,
}

impl CapstoneDisassembler {
    pub fn new(mode: Mode) -> DisassemblerResult<Self> {
        let cs_mode = match mode {
            Mode::Bits32 => ArchMode::Mode32,
            Mode::Bits64 => ArchMode::Mode64,
        };
        // Details are required for semantic groups and branch operands
        let cs = Capstone::new()
            .x86()
            .mode(cs_mode)
            .detail(true)
            .build()
            .map_err(|e| DisassemblerError::InternalError(e.to_string()))?;
        Ok(Self { cs, mode })
    }

    fn mask(&self, v: i64) -> u64 {
        match self.mode {
            Mode::Bits32 => (v as u64) & 0xFFFF_FFFF,
            Mode::Bits64 => v as u64,
        }
    }
}

impl Disassembler for CapstoneDisassembler {
    fn disassemble_instruction(&self, address: VA, bytes: &[u8]) -> DisassemblerResult<Instruction> {
        if bytes.is_empty() {
            return Err(DisassemblerError::InsufficientBytes());
        }
        let insns = self
            .cs
            .disasm_count(bytes, address.0, 1)
            .map_err(|_| DisassemblerError::InvalidInstruction())?;
        let insn = insns
            .iter()
            .next()
            .ok_or(DisassemblerError::InvalidInstruction())?;
        let mnemonic = insn.mnemonic().unwrap_or("").to_string();

        let mut groups = InstructionGroups::empty();
        let mut relative = false;
        let mut targets = Vec::new();
        if let Ok(detail) = self.cs.insn_detail(insn) {
            for g in detail.groups() {
                match self.cs.group_name(*g).as_deref() {
                    Some("call") => groups |= InstructionGroups::CALL,
                    Some("jump") => groups |= InstructionGroups::JUMP,
                    Some("ret") | Some("iret") => groups |= InstructionGroups::RETURN,
                    Some("int") => groups |= InstructionGroups::INTERRUPT,
                    Some("branch_relative") => relative = true,
                    _ => {}
                }
            }
            if relative && groups.intersects(InstructionGroups::CALL | InstructionGroups::JUMP) {
                if let Some(x86) = detail.arch_detail().x86() {
                    for op in x86.operands() {
                        if let X86OperandType::Imm(v) = op.op_type {
                            targets.push(VA(self.mask(v)));
                        }
                    }
                }
            }
        }
        // capstone has no conditional group; jcc/loop/jecxz are the non-jmp jumps.
        // prefixes such as `bnd` or `notrack` are rendered into the mnemonic
        let base_mnemonic = mnemonic.split_whitespace().last().unwrap_or("");
        if groups.contains(InstructionGroups::JUMP) && base_mnemonic != "jmp" && base_mnemonic != "ljmp" {
            groups |= InstructionGroups::CONDITIONAL;
        }

        Ok(Instruction {
            address,
            length: insn.bytes().len() as u16,
            bytes: insn.bytes().to_vec(),
            mnemonic,
            op_str: insn.op_str().unwrap_or("").to_string(),
            groups,
            targets,
        })
    }

    fn max_instruction_length(&self) -> usize {
        15
    }

    fn arch(&self) -> Arch {
        Arch::X86
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn name(&self) -> &str {
        "capstone"
    }
}
