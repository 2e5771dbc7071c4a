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

//! Closed tag sets shared by the encoder and the decoder.

/// The opcode space. The encoded word's bits 31..26 pack two pieces of
/// information under one name, "the opcode": a 5-bit mnemonic *index* (bits
/// 30..26 — `ADD=0` .. `NOP=31`) and the 1-bit size flag `sf` (bit 31),
/// AArch64-style — orthogonal to which mnemonic it is, except for one
/// deliberate collision: `HLT` reuses `NOP`'s index (31) with `sf=1`, which
/// is why it reads as `63` (`(1<<5)|31`) rather than a value of its own. See
/// DESIGN.md for why this reading was chosen over packing opcode and `sf`
/// as two independent fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Add,
    AddI,
    Sub,
    SubI,
    And,
    AndI,
    Orr,
    OrrI,
    Eor,
    EorI,
    Mov,
    MovI,
    Cmp,
    CmpI,
    Mul,
    Sdiv,
    Udiv,
    Ldrb,
    Ldrh,
    Ldrw,
    Ldrd,
    Strb,
    Strh,
    Strw,
    Strd,
    B,
    BCond,
    Bl,
    Blr,
    Br,
    Ret,
    Nop,
    Hlt,
}

impl Opcode {
    /// The 5-bit mnemonic index (bits 30..26), independent of `sf`.
    pub fn index(self) -> u32 {
        use Opcode::*;
        match self {
            Add => 0,
            AddI => 1,
            Sub => 2,
            SubI => 3,
            And => 4,
            AndI => 5,
            Orr => 6,
            OrrI => 7,
            Eor => 8,
            EorI => 9,
            Mov => 10,
            MovI => 11,
            Cmp => 12,
            CmpI => 13,
            Mul => 14,
            Sdiv => 15,
            Udiv => 16,
            Ldrb => 17,
            Ldrh => 18,
            Ldrw => 19,
            Ldrd => 20,
            Strb => 21,
            Strh => 22,
            Strw => 23,
            Strd => 24,
            B => 25,
            BCond => 26,
            Bl => 27,
            Blr => 28,
            Br => 29,
            Ret => 30,
            Nop | Hlt => 31,
        }
    }

    /// Whether this opcode's `sf` bit is meaningful (selects W vs X on the
    /// instruction's register operands). Branches and NOP/RET ignore width;
    /// HLT fixes `sf=1` purely to disambiguate from NOP on the wire.
    pub fn is_width_bearing(self) -> bool {
        use Opcode::*;
        !matches!(self, B | BCond | Bl | Blr | Br | Ret | Nop | Hlt)
    }

    /// Decodes `(index, sf)` extracted from bits 30..26 and 31 respectively.
    pub fn from_fields(index: u32, sf: u32) -> Option<Opcode> {
        use Opcode::*;
        Some(match index {
            0 => Add,
            1 => AddI,
            2 => Sub,
            3 => SubI,
            4 => And,
            5 => AndI,
            6 => Orr,
            7 => OrrI,
            8 => Eor,
            9 => EorI,
            10 => Mov,
            11 => MovI,
            12 => Cmp,
            13 => CmpI,
            14 => Mul,
            15 => Sdiv,
            16 => Udiv,
            17 => Ldrb,
            18 => Ldrh,
            19 => Ldrw,
            20 => Ldrd,
            21 => Strb,
            22 => Strh,
            23 => Strw,
            24 => Strd,
            25 => B,
            26 => BCond,
            27 => Bl,
            28 => Blr,
            29 => Br,
            30 => Ret,
            31 => {
                if sf != 0 {
                    Hlt
                } else {
                    Nop
                }
            }
            _ => return None,
        })
    }

    /// The literal 6-bit opcode field value (`(sf << 5) | index`).
    pub fn field_value(self, sf: u32) -> u32 {
        (sf << 5) | self.index()
    }

    pub fn class(self) -> InstructionType {
        use InstructionType as T;
        use Opcode::*;
        match self {
            Add | Sub | And | Orr | Eor => T::DataProcReg,
            AddI | SubI | AndI | OrrI | EorI => T::DataProcImm,
            Mov => T::MoveReg,
            MovI => T::MoveImm,
            Cmp | CmpI => T::Compare,
            Mul => T::Multiply,
            Sdiv | Udiv => T::Divide,
            Ldrb | Ldrh | Ldrw | Ldrd | Strb | Strh | Strw | Strd => T::LoadStore,
            B => T::BranchUncond,
            BCond => T::BranchCond,
            Bl => T::BranchLink,
            Blr | Br | Ret => T::BranchReg,
            Nop | Hlt => T::System,
        }
    }
}

/// The coarse instruction class used to select the decoder/executor handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionType {
    DataProcReg,
    DataProcImm,
    LoadStore,
    BranchUncond,
    BranchCond,
    BranchLink,
    BranchReg,
    Compare,
    MoveReg,
    MoveImm,
    Multiply,
    Divide,
    System,
}

/// The arithmetic/logical operation the ALU performs, independent of how the
/// operands were fetched (register, immediate, compare-discard).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ALUOp {
    Add,
    Sub,
    And,
    Orr,
    Eor,
    Mul,
    /// Flag-setting variants reserved at the descriptor level; no mnemonic
    /// in the assembler table produces them.
    Adds,
    Subs,
    Ands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataProcOp {
    Add,
    Sub,
    And,
    Orr,
    Eor,
}

impl DataProcOp {
    pub fn alu_op(self) -> ALUOp {
        match self {
            DataProcOp::Add => ALUOp::Add,
            DataProcOp::Sub => ALUOp::Sub,
            DataProcOp::And => ALUOp::And,
            DataProcOp::Orr => ALUOp::Orr,
            DataProcOp::Eor => ALUOp::Eor,
        }
    }

    /// ADD/SUB set flags; AND/ORR/EOR do not.
    pub fn sets_flags(self) -> bool {
        matches!(self, DataProcOp::Add | DataProcOp::Sub)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOp {
    Ldrb,
    Ldrh,
    Ldrw,
    Ldrd,
    Strb,
    Strh,
    Strw,
    Strd,
}

impl MemoryOp {
    pub fn access_size(self) -> u32 {
        match self {
            MemoryOp::Ldrb | MemoryOp::Strb => 1,
            MemoryOp::Ldrh | MemoryOp::Strh => 2,
            MemoryOp::Ldrw | MemoryOp::Strw => 4,
            MemoryOp::Ldrd | MemoryOp::Strd => 8,
        }
    }

    pub fn is_load(self) -> bool {
        matches!(
            self,
            MemoryOp::Ldrb | MemoryOp::Ldrh | MemoryOp::Ldrw | MemoryOp::Ldrd
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemOp {
    Ret,
    Nop,
    Hlt,
}

/// 4-bit condition codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCondition {
    Eq = 0,
    Ne = 1,
    Cs = 2,
    Cc = 3,
    Mi = 4,
    Pl = 5,
    Vs = 6,
    Vc = 7,
    Hi = 8,
    Ls = 9,
    Ge = 10,
    Lt = 11,
    Gt = 12,
    Le = 13,
    Al = 14,
    Nv = 15,
}

impl BranchCondition {
    pub fn from_u32(value: u32) -> Option<BranchCondition> {
        use BranchCondition::*;
        Some(match value {
            0 => Eq,
            1 => Ne,
            2 => Cs,
            3 => Cc,
            4 => Mi,
            5 => Pl,
            6 => Vs,
            7 => Vc,
            8 => Hi,
            9 => Ls,
            10 => Ge,
            11 => Lt,
            12 => Gt,
            13 => Le,
            14 => Al,
            15 => Nv,
            _ => return None,
        })
    }

    pub fn from_mnemonic(s: &str) -> Option<BranchCondition> {
        use BranchCondition::*;
        Some(match s.to_uppercase().as_str() {
            "EQ" => Eq,
            "NE" => Ne,
            "CS" => Cs,
            "CC" => Cc,
            "MI" => Mi,
            "PL" => Pl,
            "VS" => Vs,
            "VC" => Vc,
            "HI" => Hi,
            "LS" => Ls,
            "GE" => Ge,
            "LT" => Lt,
            "GT" => Gt,
            "LE" => Le,
            "AL" => Al,
            "NV" => Nv,
            _ => return None,
        })
    }

    /// Evaluates the condition against the current NZCV flags.
    pub fn evaluate(self, n: bool, z: bool, c: bool, v: bool) -> bool {
        use BranchCondition::*;
        match self {
            Eq => z,
            Ne => !z,
            Cs => c,
            Cc => !c,
            Mi => n,
            Pl => !n,
            Vs => v,
            Vc => !v,
            Hi => c && !z,
            Ls => !c || z,
            Ge => n == v,
            Lt => n != v,
            Gt => !z && (n == v),
            Le => z || (n != v),
            Al => true,
            Nv => false,
        }
    }
}
