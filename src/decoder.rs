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

//! 32-bit word → `Instruction` descriptor.
//!
//! Field layout (MSB to LSB), mirrored by `encoder.rs`:
//!   31..26  opcode (6 bits, high bit doubles as `sf` for width-bearing classes)
//!   25..21  Rd/Rt
//!   20..16  Rn
//!    4..0   Rm                               (register-form data processing)
//!   15..0   16-bit immediate, sign-extended  (immediate-form / load-store / move-imm)
//!   25..0   26-bit signed word offset        (unconditional branch)
//!   25..22  condition code; 21..0 offset     (conditional branch)

use crate::enums::{ALUOp, BranchCondition, DataProcOp, MemoryOp, Opcode, SystemOp};
use crate::errors::DecodeError;
use crate::instruction::{BranchRegOp, CompareOperand, Instruction};
use crate::types::{sign_extend, Immediate, MemoryOperand, Register, RegWidth};

fn field(word: u32, hi: u32, lo: u32) -> u32 {
    let width = hi - lo + 1;
    let mask = if width >= 32 { u32::MAX } else { (1u32 << width) - 1 };
    (word >> lo) & mask
}

fn data_proc_op(opcode: Opcode) -> DataProcOp {
    match opcode {
        Opcode::Add | Opcode::AddI => DataProcOp::Add,
        Opcode::Sub | Opcode::SubI => DataProcOp::Sub,
        Opcode::And | Opcode::AndI => DataProcOp::And,
        Opcode::Orr | Opcode::OrrI => DataProcOp::Orr,
        Opcode::Eor | Opcode::EorI => DataProcOp::Eor,
        _ => unreachable!("data_proc_op only called for DataProc opcodes"),
    }
}

fn memory_op(opcode: Opcode) -> MemoryOp {
    match opcode {
        Opcode::Ldrb => MemoryOp::Ldrb,
        Opcode::Ldrh => MemoryOp::Ldrh,
        Opcode::Ldrw => MemoryOp::Ldrw,
        Opcode::Ldrd => MemoryOp::Ldrd,
        Opcode::Strb => MemoryOp::Strb,
        Opcode::Strh => MemoryOp::Strh,
        Opcode::Strw => MemoryOp::Strw,
        Opcode::Strd => MemoryOp::Strd,
        _ => unreachable!("memory_op only called for LoadStore opcodes"),
    }
}

pub fn decode(word: u32) -> Result<Instruction, DecodeError> {
    let sf = field(word, 31, 31);
    let index = field(word, 30, 26);
    let opcode = Opcode::from_fields(index, sf)
        .ok_or(DecodeError::UnknownOpcode(field(word, 31, 26)))?;

    let width = RegWidth::from_sf(sf);

    let rd_raw = field(word, 25, 21) as u8;
    let rn_raw = field(word, 20, 16) as u8;
    let rm_raw = field(word, 4, 0) as u8;
    let imm16 = Immediate::new(sign_extend(field(word, 15, 0) as u64, 16), 16);

    use crate::enums::InstructionType as T;
    Ok(match opcode.class() {
        T::DataProcReg => Instruction::DataProcReg {
            op: data_proc_op(opcode),
            rd: Register::new(rd_raw, width),
            rn: Register::new(rn_raw, width),
            rm: Register::new(rm_raw, width),
            shift: 0,
        },
        T::DataProcImm => Instruction::DataProcImm {
            op: data_proc_op(opcode),
            rd: Register::new(rd_raw, width),
            rn: Register::new(rn_raw, width),
            imm: imm16,
        },
        T::LoadStore => Instruction::LoadStore {
            op: memory_op(opcode),
            rt: Register::new(rd_raw, width),
            mem: MemoryOperand::simple(Register::new(rn_raw, RegWidth::X), imm16),
        },
        T::BranchUncond => Instruction::BranchUncond {
            offset_words: sign_extend(field(word, 25, 0) as u64, 26),
        },
        T::BranchCond => {
            let cond_raw = field(word, 25, 22);
            let cond =
                BranchCondition::from_u32(cond_raw)
                    .ok_or(DecodeError::UnknownOpcode(field(word, 31, 26)))?;
            Instruction::BranchCond {
                cond,
                offset_words: sign_extend(field(word, 21, 0) as u64, 22),
            }
        }
        T::BranchLink => Instruction::BranchLink {
            offset_words: sign_extend(field(word, 25, 0) as u64, 26),
        },
        T::BranchReg => {
            let op = match opcode {
                Opcode::Blr => BranchRegOp::Blr,
                Opcode::Br => BranchRegOp::Br,
                Opcode::Ret => BranchRegOp::Ret,
                _ => unreachable!(),
            };
            Instruction::BranchReg {
                op,
                rn: Register::new(rn_raw, RegWidth::X),
            }
        }
        T::Compare => Instruction::Compare {
            rn: Register::new(rn_raw, width),
            operand: match opcode {
                Opcode::Cmp => CompareOperand::Reg(Register::new(rm_raw, width)),
                Opcode::CmpI => CompareOperand::Imm(imm16),
                _ => unreachable!(),
            },
        },
        T::MoveReg => Instruction::MoveReg {
            rd: Register::new(rd_raw, width),
            rn: Register::new(rm_raw, width),
        },
        T::MoveImm => Instruction::MoveImm {
            rd: Register::new(rd_raw, width),
            imm: imm16,
        },
        T::Multiply => Instruction::Multiply {
            rd: Register::new(rd_raw, width),
            rn: Register::new(rn_raw, width),
            rm: Register::new(rm_raw, width),
        },
        T::Divide => Instruction::Divide {
            signed: matches!(opcode, Opcode::Sdiv),
            rd: Register::new(rd_raw, width),
            rn: Register::new(rn_raw, width),
            rm: Register::new(rm_raw, width),
        },
        T::System => Instruction::System {
            op: match opcode {
                Opcode::Ret => SystemOp::Ret,
                Opcode::Nop => SystemOp::Nop,
                Opcode::Hlt => SystemOp::Hlt,
                _ => unreachable!(),
            },
        },
    })
}

/// The descriptor-level op a `DataProcReg`/`DataProcImm` decodes to, used by
/// the executor to pick the ALU entry point.
pub fn alu_op_for(op: DataProcOp) -> ALUOp {
    op.alu_op()
}
