/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! `Instruction` descriptor → 32-bit word. The inverse of `decoder::decode`;
//! field positions are documented there.

use crate::enums::{MemoryOp, Opcode};
use crate::instruction::{BranchRegOp, CompareOperand, Instruction};
use crate::types::RegWidth;

fn bits(value: u32, width: u32, shift: u32) -> u32 {
    let mask = if width >= 32 { u32::MAX } else { (1u32 << width) - 1 };
    (value & mask) << shift
}

fn opcode_field(op: Opcode, width: RegWidth) -> u32 {
    // HLT shares NOP's mnemonic index and is told apart from it only by
    // `sf`, which must be forced to 1 regardless of `width` (see
    // `Opcode::is_width_bearing`).
    let sf = if op == Opcode::Hlt {
        1
    } else if op.is_width_bearing() {
        width.sf()
    } else {
        0
    };
    bits(op.field_value(sf), 6, 26)
}

fn data_proc_opcode(op: crate::enums::DataProcOp, imm_form: bool) -> Opcode {
    use crate::enums::DataProcOp as D;
    match (op, imm_form) {
        (D::Add, false) => Opcode::Add,
        (D::Add, true) => Opcode::AddI,
        (D::Sub, false) => Opcode::Sub,
        (D::Sub, true) => Opcode::SubI,
        (D::And, false) => Opcode::And,
        (D::And, true) => Opcode::AndI,
        (D::Orr, false) => Opcode::Orr,
        (D::Orr, true) => Opcode::OrrI,
        (D::Eor, false) => Opcode::Eor,
        (D::Eor, true) => Opcode::EorI,
    }
}

fn memory_opcode(op: MemoryOp) -> Opcode {
    match op {
        MemoryOp::Ldrb => Opcode::Ldrb,
        MemoryOp::Ldrh => Opcode::Ldrh,
        MemoryOp::Ldrw => Opcode::Ldrw,
        MemoryOp::Ldrd => Opcode::Ldrd,
        MemoryOp::Strb => Opcode::Strb,
        MemoryOp::Strh => Opcode::Strh,
        MemoryOp::Strw => Opcode::Strw,
        MemoryOp::Strd => Opcode::Strd,
    }
}

/// Encodes a fully-resolved instruction descriptor into its 32-bit word.
/// Branch variants encode `offset_words` directly; labels are already
/// resolved to addresses by the time a descriptor reaches this function.
pub fn encode(instr: &Instruction) -> u32 {
    match instr {
        Instruction::DataProcReg { op, rd, rn, rm, .. } => {
            opcode_field(data_proc_opcode(*op, false), rd.width)
                | bits(rd.number as u32, 5, 21)
                | bits(rn.number as u32, 5, 16)
                | bits(rm.number as u32, 5, 0)
        }
        Instruction::DataProcImm { op, rd, rn, imm } => {
            opcode_field(data_proc_opcode(*op, true), rd.width)
                | bits(rd.number as u32, 5, 21)
                | bits(rn.number as u32, 5, 16)
                | bits(imm.value as u32, 16, 0)
        }
        Instruction::LoadStore { op, rt, mem } => {
            opcode_field(memory_opcode(*op), rt.width)
                | bits(rt.number as u32, 5, 21)
                | bits(mem.base.number as u32, 5, 16)
                | bits(mem.offset.value as u32, 16, 0)
        }
        Instruction::BranchUncond { offset_words } => {
            opcode_field(Opcode::B, RegWidth::W) | bits(*offset_words as u32, 26, 0)
        }
        Instruction::BranchCond { cond, offset_words } => {
            opcode_field(Opcode::BCond, RegWidth::W)
                | bits(*cond as u32, 4, 22)
                | bits(*offset_words as u32, 22, 0)
        }
        Instruction::BranchLink { offset_words } => {
            opcode_field(Opcode::Bl, RegWidth::W) | bits(*offset_words as u32, 26, 0)
        }
        Instruction::BranchReg { op, rn } => {
            let opcode = match op {
                BranchRegOp::Blr => Opcode::Blr,
                BranchRegOp::Br => Opcode::Br,
                BranchRegOp::Ret => Opcode::Ret,
            };
            opcode_field(opcode, RegWidth::X) | bits(rn.number as u32, 5, 16)
        }
        Instruction::Compare { rn, operand } => match operand {
            CompareOperand::Reg(rm) => {
                opcode_field(Opcode::Cmp, rn.width)
                    | bits(rn.number as u32, 5, 16)
                    | bits(rm.number as u32, 5, 0)
            }
            CompareOperand::Imm(imm) => {
                opcode_field(Opcode::CmpI, rn.width)
                    | bits(rn.number as u32, 5, 16)
                    | bits(imm.value as u32, 16, 0)
            }
        },
        Instruction::MoveReg { rd, rn } => {
            opcode_field(Opcode::Mov, rd.width)
                | bits(rd.number as u32, 5, 21)
                | bits(rn.number as u32, 5, 0)
        }
        Instruction::MoveImm { rd, imm } => {
            opcode_field(Opcode::MovI, rd.width)
                | bits(rd.number as u32, 5, 21)
                | bits(imm.value as u32, 16, 0)
        }
        Instruction::Multiply { rd, rn, rm } => {
            opcode_field(Opcode::Mul, rd.width)
                | bits(rd.number as u32, 5, 21)
                | bits(rn.number as u32, 5, 16)
                | bits(rm.number as u32, 5, 0)
        }
        Instruction::Divide { signed, rd, rn, rm } => {
            let opcode = if *signed { Opcode::Sdiv } else { Opcode::Udiv };
            opcode_field(opcode, rd.width)
                | bits(rd.number as u32, 5, 21)
                | bits(rn.number as u32, 5, 16)
                | bits(rm.number as u32, 5, 0)
        }
        Instruction::System { op } => {
            use crate::enums::SystemOp;
            let opcode = match op {
                SystemOp::Ret => Opcode::Ret,
                SystemOp::Nop => Opcode::Nop,
                SystemOp::Hlt => Opcode::Hlt,
            };
            opcode_field(opcode, RegWidth::W)
        }
    }
}

/// Instruction size in bytes for pass-1 address bookkeeping. Every real
/// instruction word in this ISA is 32 bits; kept as its own constant so
/// pass 1 never has to know the encoding in detail.
pub const INSTRUCTION_SIZE_BYTES: u32 = 4;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use crate::enums::DataProcOp;
    use crate::instruction::Instruction;
    use crate::types::{Immediate, Register};

    #[test]
    fn encode_then_decode_data_proc_reg() {
        let instr = Instruction::DataProcReg {
            op: DataProcOp::Add,
            rd: Register::new(2, RegWidth::W),
            rn: Register::new(0, RegWidth::W),
            rm: Register::new(1, RegWidth::W),
            shift: 0,
        };
        let word = encode(&instr);
        assert_eq!(decode(word).unwrap(), instr);
    }

    #[test]
    fn encode_then_decode_move_imm_x_width() {
        let instr = Instruction::MoveImm {
            rd: Register::new(0, RegWidth::X),
            imm: Immediate::new(0x1234, 16),
        };
        let word = encode(&instr);
        assert_eq!(decode(word).unwrap(), instr);
    }

    #[test]
    fn hlt_does_not_collide_with_nop_on_the_wire() {
        use crate::enums::SystemOp;
        let hlt = encode(&Instruction::System { op: SystemOp::Hlt });
        let nop = encode(&Instruction::System { op: SystemOp::Nop });
        assert_ne!(hlt, nop);
        assert_eq!(decode(hlt).unwrap(), Instruction::System { op: SystemOp::Hlt });
        assert_eq!(decode(nop).unwrap(), Instruction::System { op: SystemOp::Nop });
    }
}
