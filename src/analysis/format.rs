//! Text rendering of decoded instructions.

use crate::core::address::VA;
use crate::core::instruction::Instruction;
use crate::error::Result;
use crate::workspace::Workspace;

/// Render `insn` as `0x<va>: <opcodes> <mnemonic> <operands>`.
///
/// The opcode column holds at most `num_opcode_bytes` bytes as hex; longer
/// instructions are cut and marked with `..`.
pub fn format_instruction(insn: &Instruction, num_opcode_bytes: usize) -> String {
    let shown = insn.bytes.len().min(num_opcode_bytes);
    let mut opcodes = hex::encode(&insn.bytes[..shown]);
    if shown < insn.bytes.len() {
        opcodes.push_str("..");
    }

    let width = num_opcode_bytes * 2 + 2;
    if insn.op_str.is_empty() {
        format!("{}: {:<width$} {}", insn.address, opcodes, insn.mnemonic, width = width)
    } else {
        format!(
            "{}: {:<width$} {} {}",
            insn.address,
            opcodes,
            insn.mnemonic,
            insn.op_str,
            width = width
        )
    }
}

/// Decode the instruction at `va` and render it.
///
/// Returns the rendered line and the instruction length.
pub fn format_address_disassembly(ws: &Workspace, va: VA, num_opcode_bytes: usize) -> Result<(String, u64)> {
    let insn = ws.decode_one(va)?;
    Ok((format_instruction(&insn, num_opcode_bytes), insn.length as u64))
}
