use iced_x86::{
    Decoder, DecoderError, DecoderOptions, FlowControl, Formatter, IntelFormatter, OpKind,
};

use crate::core::address::VA;
use crate::core::disassembler::{Arch, Disassembler, DisassemblerError, DisassemblerResult, Mode};
use crate::core::instruction::{Instruction, InstructionGroups};

pub struct IcedDisassembler {
    bits: u32,
    mode: Mode,
}

impl IcedDisassembler {
    pub fn new(mode: Mode) -> Self {
        Self {
            bits: mode.bits(),
            mode,
        }
    }

    fn groups(flow: FlowControl) -> InstructionGroups {
        match flow {
            FlowControl::Next | FlowControl::XbeginXabortXend => InstructionGroups::empty(),
            FlowControl::UnconditionalBranch | FlowControl::IndirectBranch => {
                InstructionGroups::JUMP
            }
            FlowControl::ConditionalBranch => {
                InstructionGroups::JUMP | InstructionGroups::CONDITIONAL
            }
            FlowControl::Call | FlowControl::IndirectCall => InstructionGroups::CALL,
            FlowControl::Return => InstructionGroups::RETURN,
            FlowControl::Interrupt | FlowControl::Exception => InstructionGroups::INTERRUPT,
        }
    }

    fn near_targets(instr: &iced_x86::Instruction) -> Vec<VA> {
        match instr.flow_control() {
            FlowControl::UnconditionalBranch | FlowControl::ConditionalBranch | FlowControl::Call => {
                (0..instr.op_count())
                    .filter(|&i| {
                        matches!(
                            instr.op_kind(i),
                            OpKind::NearBranch16 | OpKind::NearBranch32 | OpKind::NearBranch64
                        )
                    })
                    .map(|_| VA(instr.near_branch_target()))
                    .collect()
            }
            // far branches carry a segment selector; not modeled
            _ => Vec::new(),
        }
    }
}

impl Disassembler for IcedDisassembler {
    fn disassemble_instruction(&self, address: VA, bytes: &[u8]) -> DisassemblerResult<Instruction> {
        if bytes.is_empty() {
            return Err(DisassemblerError::InsufficientBytes());
        }
        let mut decoder = Decoder::with_ip(self.bits, bytes, address.0, DecoderOptions::NONE);
        let instr = decoder.decode();
        if instr.is_invalid() {
            return Err(match decoder.last_error() {
                DecoderError::NoMoreBytes => DisassemblerError::InsufficientBytes(),
                _ => DisassemblerError::InvalidInstruction(),
            });
        }

        let len = instr.len();
        let mut fmt = IntelFormatter::new();
        let mut mnemonic = String::new();
        fmt.format_mnemonic(&instr, &mut mnemonic);
        let mut op_str = String::new();
        fmt.format_all_operands(&instr, &mut op_str);

        Ok(Instruction {
            address,
            length: len as u16,
            bytes: bytes[..len.min(bytes.len())].to_vec(),
            mnemonic,
            op_str,
            groups: Self::groups(instr.flow_control()),
            targets: Self::near_targets(&instr),
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
        "iced-x86"
    }
}
