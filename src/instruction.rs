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

//! The language-neutral instruction descriptor produced by decode and
//! consumed by execute. One variant per instruction class; each variant
//! carries only the fields meaningful for its class.

use crate::enums::{BranchCondition, DataProcOp, MemoryOp, SystemOp};
use crate::types::{Immediate, MemoryOperand, Register};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    DataProcReg {
        op: DataProcOp,
        rd: Register,
        rn: Register,
        rm: Register,
        shift: u32,
    },
    DataProcImm {
        op: DataProcOp,
        rd: Register,
        rn: Register,
        imm: Immediate,
    },
    LoadStore {
        op: MemoryOp,
        rt: Register,
        mem: MemoryOperand,
    },
    BranchUncond {
        offset_words: i64,
    },
    BranchCond {
        cond: BranchCondition,
        offset_words: i64,
    },
    BranchLink {
        offset_words: i64,
    },
    BranchReg {
        op: BranchRegOp,
        rn: Register,
    },
    Compare {
        rn: Register,
        operand: CompareOperand,
    },
    MoveReg {
        rd: Register,
        rn: Register,
    },
    MoveImm {
        rd: Register,
        imm: Immediate,
    },
    Multiply {
        rd: Register,
        rn: Register,
        rm: Register,
    },
    Divide {
        signed: bool,
        rd: Register,
        rn: Register,
        rm: Register,
    },
    System {
        op: SystemOp,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchRegOp {
    Blr,
    Br,
    Ret,
}

/// `CMP`'s second operand: a register (CMP form) or sign-extended immediate
/// (CMPI form). Both encode to the same `Compare` descriptor variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperand {
    Reg(Register),
    Imm(Immediate),
}
