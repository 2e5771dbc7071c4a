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

//! Executes a decoded `Instruction` against a `Cpu`'s register file, flags,
//! memory and program counter.

use crate::alu::{alu, op_sets_flags};
use crate::decoder::alu_op_for;
use crate::enums::SystemOp;
use crate::errors::ExecError;
use crate::instruction::{BranchRegOp, CompareOperand, Instruction};
use crate::registers::{Flags, RegisterFile};
use crate::types::{MemoryOperand, Register, RegWidth};
use crate::memory::Memory;

/// Mutable execution context: everything an instruction can read or write.
/// `pc` has already been advanced past the instruction being executed, per
/// the fetch contract documented on `Cpu::step`.
pub struct ExecState<'a> {
    pub regs: &'a mut RegisterFile,
    pub flags: &'a mut Flags,
    pub memory: &'a mut Memory,
    pub pc: &'a mut u64,
}

fn effective_address(state: &ExecState, mem: &MemoryOperand) -> Result<u64, ExecError> {
    let base = state.regs.read_x(mem.base.number)?;
    let index = match mem.index {
        Some(reg) => state.regs.read(reg)?,
        None => 0,
    };
    let offset = mem.offset.sign_extended();
    Ok(base.wrapping_add(index).wrapping_add(offset as u64))
}

/// Applies pre/post-index base-register writeback: pre-index updates the
/// base before the access, post-index after.
fn writeback(state: &mut ExecState, mem: &MemoryOperand, addr: u64) -> Result<(), ExecError> {
    if mem.pre_index || mem.post_index {
        state.regs.write(mem.base, addr)?;
    }
    Ok(())
}

pub fn execute(instr: &Instruction, state: &mut ExecState) -> Result<(), ExecError> {
    match instr {
        Instruction::DataProcReg { op, rd, rn, rm, .. } => {
            let a = state.regs.read(*rn)?;
            let b = state.regs.read(*rm)?;
            apply_alu(state, op.alu_op(), *rd, a, b, op.sets_flags())?;
        }
        Instruction::DataProcImm { op, rd, rn, imm } => {
            let a = state.regs.read(*rn)?;
            let b = imm.sign_extended() as u64;
            apply_alu(state, op.alu_op(), *rd, a, b, op.sets_flags())?;
        }
        Instruction::LoadStore { op, rt, mem } => {
            // Pre/post-indexed addressing is modeled on `MemoryOperand` but no
            // mnemonic in the assembler's table produces it yet; every access
            // below goes through the plain `[base, #imm]` path, where the
            // access address and the effective address coincide.
            let access_addr = if mem.post_index {
                state.regs.read_x(mem.base.number)?
            } else {
                effective_address(state, mem)?
            };
            let size = op.access_size();
            if op.is_load() {
                let value = state.memory.read_sized(access_addr, size)?;
                state.regs.write(*rt, value)?;
            } else {
                let value = state.regs.read(*rt)?;
                state.memory.write_sized(access_addr, value, size)?;
            }
            if mem.pre_index {
                writeback(state, mem, access_addr)?;
            } else if mem.post_index {
                let post_addr = effective_address(state, mem)?;
                writeback(state, mem, post_addr)?;
            }
        }
        Instruction::BranchUncond { offset_words } => {
            branch_by_words(state, *offset_words);
        }
        Instruction::BranchCond { cond, offset_words } => {
            if cond.evaluate(state.flags.n, state.flags.z, state.flags.c, state.flags.v) {
                branch_by_words(state, *offset_words);
            }
        }
        Instruction::BranchLink { offset_words } => {
            state.regs.set_lr(*state.pc);
            branch_by_words(state, *offset_words);
        }
        Instruction::BranchReg { op, rn } => {
            let target = state.regs.read_x(rn.number)?;
            if matches!(op, BranchRegOp::Blr) {
                state.regs.set_lr(*state.pc);
            }
            *state.pc = target;
        }
        Instruction::Compare { rn, operand } => {
            let a = state.regs.read(*rn)?;
            let b = match operand {
                CompareOperand::Reg(rm) => state.regs.read(*rm)?,
                CompareOperand::Imm(imm) => imm.sign_extended() as u64,
            };
            let width = rn.width.bits();
            let result = alu(crate::enums::ALUOp::Sub, a, b, width);
            *state.flags = result.flags;
        }
        Instruction::MoveReg { rd, rn } => {
            let value = state.regs.read(*rn)?;
            state.regs.write(*rd, value)?;
        }
        Instruction::MoveImm { rd, imm } => {
            state.regs.write(*rd, imm.sign_extended() as u64)?;
        }
        Instruction::Multiply { rd, rn, rm } => {
            let a = state.regs.read(*rn)?;
            let b = state.regs.read(*rm)?;
            apply_alu(state, crate::enums::ALUOp::Mul, *rd, a, b, false)?;
        }
        Instruction::Divide { signed, rd, rn, rm } => {
            let a = state.regs.read(*rn)?;
            let b = state.regs.read(*rm)?;
            if b == 0 {
                return Err(ExecError::DivisionByZero);
            }
            let width = rd.width;
            let quotient = if *signed {
                let sa = sign_at_width(a, width);
                let sb = sign_at_width(b, width);
                (sa.wrapping_div(sb)) as u64
            } else {
                a.wrapping_div(b)
            };
            state.regs.write(*rd, quotient)?;
        }
        Instruction::System { op } => match op {
            SystemOp::Nop => {}
            SystemOp::Ret => {
                let target = state.regs.lr();
                *state.pc = target;
            }
            SystemOp::Hlt => return Err(ExecError::Halted),
        },
    }
    Ok(())
}

fn sign_at_width(value: u64, width: RegWidth) -> i64 {
    match width {
        RegWidth::W => (value as u32) as i32 as i64,
        RegWidth::X => value as i64,
    }
}

fn apply_alu(
    state: &mut ExecState,
    op: crate::enums::ALUOp,
    rd: Register,
    a: u64,
    b: u64,
    sets_flags: bool,
) -> Result<(), ExecError> {
    let width = rd.width.bits();
    let result = alu(op, a, b, width);
    state.regs.write(rd, result.value)?;
    if sets_flags || op_sets_flags(op) {
        *state.flags = result.flags;
    }
    Ok(())
}

fn branch_by_words(state: &mut ExecState, offset_words: i64) {
    let delta = offset_words.wrapping_mul(4);
    *state.pc = (*state.pc as i64).wrapping_add(delta) as u64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::RegisterFile;
    use crate::types::{Immediate, RegWidth};

    fn harness() -> (RegisterFile, Flags, Memory, u64) {
        (RegisterFile::new(), Flags::default(), Memory::new(), 4)
    }

    #[test]
    fn add_immediate_sets_flags_and_writes_destination() {
        let (mut regs, mut flags, mut mem, mut pc) = harness();
        let mut state = ExecState {
            regs: &mut regs,
            flags: &mut flags,
            memory: &mut mem,
            pc: &mut pc,
        };
        let instr = Instruction::DataProcImm {
            op: crate::enums::DataProcOp::Add,
            rd: Register::new(0, RegWidth::W),
            rn: Register::new(1, RegWidth::W),
            imm: Immediate::new(5, 16),
        };
        execute(&instr, &mut state).unwrap();
        assert_eq!(regs.read_x(0).unwrap(), 5);
    }

    #[test]
    fn conditional_branch_taken_adjusts_pc() {
        let (mut regs, mut flags, mut mem, mut pc) = harness();
        flags.z = true;
        let mut state = ExecState {
            regs: &mut regs,
            flags: &mut flags,
            memory: &mut mem,
            pc: &mut pc,
        };
        let instr = Instruction::BranchCond {
            cond: crate::enums::BranchCondition::Eq,
            offset_words: 3,
        };
        execute(&instr, &mut state).unwrap();
        assert_eq!(*state.pc, 4 + 12);
    }

    #[test]
    fn conditional_branch_not_taken_leaves_pc() {
        let (mut regs, mut flags, mut mem, mut pc) = harness();
        flags.z = false;
        let mut state = ExecState {
            regs: &mut regs,
            flags: &mut flags,
            memory: &mut mem,
            pc: &mut pc,
        };
        let instr = Instruction::BranchCond {
            cond: crate::enums::BranchCondition::Eq,
            offset_words: 3,
        };
        execute(&instr, &mut state).unwrap();
        assert_eq!(*state.pc, 4);
    }

    #[test]
    fn branch_link_saves_return_address() {
        let (mut regs, mut flags, mut mem, mut pc) = harness();
        let mut state = ExecState {
            regs: &mut regs,
            flags: &mut flags,
            memory: &mut mem,
            pc: &mut pc,
        };
        let instr = Instruction::BranchLink { offset_words: 10 };
        execute(&instr, &mut state).unwrap();
        assert_eq!(state.regs.lr(), 4);
        assert_eq!(*state.pc, 4 + 40);
    }

    #[test]
    fn ret_jumps_to_link_register() {
        let (mut regs, mut flags, mut mem, mut pc) = harness();
        regs.set_lr(0x40);
        let mut state = ExecState {
            regs: &mut regs,
            flags: &mut flags,
            memory: &mut mem,
            pc: &mut pc,
        };
        execute(&Instruction::System { op: SystemOp::Ret }, &mut state).unwrap();
        assert_eq!(*state.pc, 0x40);
    }

    #[test]
    fn hlt_returns_halted_sentinel() {
        let (mut regs, mut flags, mut mem, mut pc) = harness();
        let mut state = ExecState {
            regs: &mut regs,
            flags: &mut flags,
            memory: &mut mem,
            pc: &mut pc,
        };
        let err = execute(&Instruction::System { op: SystemOp::Hlt }, &mut state).unwrap_err();
        assert_eq!(err, ExecError::Halted);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let (mut regs, mut flags, mut mem, mut pc) = harness();
        let mut state = ExecState {
            regs: &mut regs,
            flags: &mut flags,
            memory: &mut mem,
            pc: &mut pc,
        };
        let instr = Instruction::Divide {
            signed: false,
            rd: Register::new(0, RegWidth::W),
            rn: Register::new(1, RegWidth::W),
            rm: Register::new(2, RegWidth::W),
        };
        let err = execute(&instr, &mut state).unwrap_err();
        assert_eq!(err, ExecError::DivisionByZero);
    }

    #[test]
    fn store_then_load_round_trips_through_memory() {
        let (mut regs, mut flags, mut mem, mut pc) = harness();
        regs.write(Register::new(1, RegWidth::X), 0xABCD).unwrap();
        let mut state = ExecState {
            regs: &mut regs,
            flags: &mut flags,
            memory: &mut mem,
            pc: &mut pc,
        };
        let store = Instruction::LoadStore {
            op: crate::enums::MemoryOp::Strd,
            rt: Register::new(1, RegWidth::X),
            mem: MemoryOperand::simple(Register::new(0, RegWidth::X), Immediate::new(0, 16)),
        };
        execute(&store, &mut state).unwrap();
        let load = Instruction::LoadStore {
            op: crate::enums::MemoryOp::Ldrd,
            rt: Register::new(2, RegWidth::X),
            mem: MemoryOperand::simple(Register::new(0, RegWidth::X), Immediate::new(0, 16)),
        };
        execute(&load, &mut state).unwrap();
        assert_eq!(regs.read_x(2).unwrap(), 0xABCD);
    }

    #[test]
    fn compare_sets_flags_without_writing_a_register() {
        let (mut regs, mut flags, mut mem, mut pc) = harness();
        regs.write(Register::new(0, RegWidth::W), 5).unwrap();
        regs.write(Register::new(1, RegWidth::W), 5).unwrap();
        let mut state = ExecState {
            regs: &mut regs,
            flags: &mut flags,
            memory: &mut mem,
            pc: &mut pc,
        };
        let instr = Instruction::Compare {
            rn: Register::new(0, RegWidth::W),
            operand: CompareOperand::Reg(Register::new(1, RegWidth::W)),
        };
        execute(&instr, &mut state).unwrap();
        assert!(state.flags.z);
    }
}
