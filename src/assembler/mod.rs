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

//! Two-pass assembler: pass one walks every line to record each label's
//! byte address, pass two encodes each instruction or data directive into
//! its final 32-bit word, resolving label references against the
//! already-complete table built in pass one.

pub mod encoder;
mod lexer;

use std::collections::HashMap;

use crate::enums::{BranchCondition, DataProcOp};
use crate::errors::AssemblyError;
use crate::instruction::{BranchRegOp, CompareOperand, Instruction};
use crate::types::{Immediate, MemoryOperand, Register, RegWidth};
use lexer::{lex_source, DataDirective, Line, LineContent, OperandToken};

/// Assembles newline-separated source text into a flat word program.
pub fn assemble_str(source: &str) -> Result<Vec<u32>, AssemblyError> {
    let lines: Vec<String> = source.lines().map(String::from).collect();
    assemble_lines(&lines)
}

/// Assembles pre-split source lines. This is the entry point `assemble_str`
/// delegates to; both exist because callers that already hold a `Vec<String>`
/// (e.g. read one line at a time from a file) shouldn't have to rejoin and
/// resplit it.
pub fn assemble_lines(lines: &[String]) -> Result<Vec<u32>, AssemblyError> {
    let lexed = lex_source(lines)?;
    let labels = collect_labels(&lexed)?;
    encode_program(&lexed, &labels)
}

fn collect_labels(lines: &[Line]) -> Result<HashMap<String, u64>, AssemblyError> {
    let mut labels = HashMap::new();
    let mut pc: u64 = 0;
    for line in lines {
        if let Some(name) = &line.label {
            if labels.insert(name.clone(), pc).is_some() {
                return Err(AssemblyError::DuplicateLabel {
                    line: line.line_number,
                    label: name.clone(),
                });
            }
        }
        match &line.content {
            LineContent::Empty => {}
            LineContent::Data(_) => pc += encoder::INSTRUCTION_SIZE_BYTES as u64,
            LineContent::Instruction { mnemonic, operands } => {
                pc += instruction_word_count(mnemonic, operands) as u64 * encoder::INSTRUCTION_SIZE_BYTES as u64;
            }
        }
    }
    Ok(labels)
}

fn encode_program(lines: &[Line], labels: &HashMap<String, u64>) -> Result<Vec<u32>, AssemblyError> {
    let mut words = Vec::new();
    let mut pc: u64 = 0;
    for line in lines {
        match &line.content {
            LineContent::Empty => {}
            LineContent::Data(directive) => {
                words.push(encode_data(directive));
                pc += encoder::INSTRUCTION_SIZE_BYTES as u64;
            }
            LineContent::Instruction { mnemonic, operands } => {
                let instrs = build_instruction(mnemonic, operands, line.line_number, labels, pc)?;
                for instr in &instrs {
                    words.push(encoder::encode(instr));
                }
                pc += instrs.len() as u64 * encoder::INSTRUCTION_SIZE_BYTES as u64;
            }
        }
    }
    Ok(words)
}

fn encode_data(directive: &DataDirective) -> u32 {
    match directive {
        DataDirective::Int(v) => *v as u32,
        DataDirective::Float(f) => f.to_bits(),
    }
}

fn reg_at(ops: &[OperandToken], idx: usize, mnemonic: &str, line: usize) -> Result<Register, AssemblyError> {
    match ops.get(idx) {
        Some(OperandToken::Register(r)) => Ok(*r),
        Some(_) => Err(AssemblyError::BadOperand {
            line,
            token: operand_repr(&ops[idx]),
            reason: format!("{mnemonic} expects a register in this position"),
        }),
        None => Err(AssemblyError::TooFewOperands {
            line,
            mnemonic: mnemonic.to_string(),
            expected: idx + 1,
            got: ops.len(),
        }),
    }
}

fn imm_at(ops: &[OperandToken], idx: usize, mnemonic: &str, line: usize) -> Result<Immediate, AssemblyError> {
    match ops.get(idx) {
        Some(OperandToken::Immediate(v)) => Ok(Immediate::new(*v, 16)),
        Some(_) => Err(AssemblyError::BadOperand {
            line,
            token: operand_repr(&ops[idx]),
            reason: format!("{mnemonic} expects an immediate in this position"),
        }),
        None => Err(AssemblyError::TooFewOperands {
            line,
            mnemonic: mnemonic.to_string(),
            expected: idx + 1,
            got: ops.len(),
        }),
    }
}

fn label_at(ops: &[OperandToken], idx: usize, mnemonic: &str, line: usize) -> Result<String, AssemblyError> {
    match ops.get(idx) {
        Some(OperandToken::Label(name)) => Ok(name.clone()),
        Some(_) => Err(AssemblyError::BadOperand {
            line,
            token: operand_repr(&ops[idx]),
            reason: format!("{mnemonic} expects a label in this position"),
        }),
        None => Err(AssemblyError::TooFewOperands {
            line,
            mnemonic: mnemonic.to_string(),
            expected: idx + 1,
            got: ops.len(),
        }),
    }
}

fn operand_repr(op: &OperandToken) -> String {
    match op {
        OperandToken::Register(r) => format!("{:?} r{}", r.width, r.number),
        OperandToken::Immediate(v) => format!("#{v}"),
        OperandToken::Label(l) => l.clone(),
    }
}

fn resolve_label(labels: &HashMap<String, u64>, name: &str, line: usize) -> Result<u64, AssemblyError> {
    labels.get(name).copied().ok_or_else(|| AssemblyError::UnknownLabel {
        line,
        label: name.to_string(),
    })
}

/// Offset in words from the instruction *after* this one (PC has already
/// advanced by 4 at fetch time) to `target`.
fn offset_words(site_pc: u64, target: u64) -> i64 {
    (target as i64 - (site_pc as i64 + 4)) / 4
}

fn require_same_width(a: Register, b: Register, mnemonic: &str, line: usize) -> Result<(), AssemblyError> {
    if a.width != b.width {
        return Err(AssemblyError::BadOperand {
            line,
            token: mnemonic.to_string(),
            reason: "operands must share the same register width".to_string(),
        });
    }
    Ok(())
}

fn data_proc_op(mnemonic: &str) -> Option<DataProcOp> {
    Some(match mnemonic {
        "ADD" | "ADDI" => DataProcOp::Add,
        "SUB" | "SUBI" => DataProcOp::Sub,
        "AND" | "ANDI" => DataProcOp::And,
        "ORR" | "ORRI" => DataProcOp::Orr,
        "EOR" | "EORI" => DataProcOp::Eor,
        _ => return None,
    })
}

fn memory_op_for(mnemonic: &str, rt: Register) -> Option<crate::enums::MemoryOp> {
    use crate::enums::MemoryOp::*;
    Some(match mnemonic {
        "LDRB" => Ldrb,
        "LDRH" => Ldrh,
        "LDRW" => Ldrw,
        "LDRD" => Ldrd,
        "STRB" => Strb,
        "STRH" => Strh,
        "STRW" => Strw,
        "STRD" => Strd,
        "LDR" => {
            if rt.width == RegWidth::X {
                Ldrd
            } else {
                Ldrw
            }
        }
        "STR" => {
            if rt.width == RegWidth::X {
                Strd
            } else {
                Strw
            }
        }
        _ => return None,
    })
}

/// `true` if `value` fits in one sign-extended 16-bit immediate field —
/// every instruction word has room for exactly one.
fn fits_in_immediate_field(value: i64) -> bool {
    (-1i64 << 15..1i64 << 15).contains(&value)
}

/// Builds `MOV rd, #value`. When `value` fits in the one 16-bit immediate
/// field a word has room for, this is a single `MoveImm`. Wider constants
/// can't be — opcode and `Rd` alone already take 11 of the word's 32 bits,
/// the same wall real AArch64 hits and solves with multiple `movz`/`movk`.
/// This ISA has no `movk`, so a wide constant is synthesized instead: start
/// at 0 and walk `value`'s bits from the top, doubling the accumulator each
/// step and adding 1 wherever a bit is set.
fn expand_move(rd: Register, value: i64) -> Vec<Instruction> {
    if fits_in_immediate_field(value) {
        return vec![Instruction::MoveImm { rd, imm: Immediate::new(value, 16) }];
    }

    let width_bits = rd.width.bits();
    let bits = if width_bits >= 64 {
        value as u64
    } else {
        (value as u64) & ((1u64 << width_bits) - 1)
    };
    let highest = 63 - bits.leading_zeros();

    let mut out = vec![Instruction::MoveImm { rd, imm: Immediate::new(0, 16) }];
    for i in (0..=highest).rev() {
        out.push(Instruction::DataProcReg {
            op: DataProcOp::Add,
            rd,
            rn: rd,
            rm: rd,
            shift: 0,
        });
        if (bits >> i) & 1 == 1 {
            out.push(Instruction::DataProcImm {
                op: DataProcOp::Add,
                rd,
                rn: rd,
                imm: Immediate::new(1, 16),
            });
        }
    }
    out
}

/// How many words a line will assemble to. `collect_labels` needs this to
/// keep label addresses in step with what `encode_program` actually emits,
/// since a wide `MOV` expands to more than one word (see `expand_move`).
fn instruction_word_count(mnemonic: &str, ops: &[OperandToken]) -> usize {
    if matches!(mnemonic, "MOV" | "MOVI") {
        if let (Some(OperandToken::Register(rd)), Some(OperandToken::Immediate(v))) = (ops.first(), ops.get(1)) {
            return expand_move(*rd, *v).len();
        }
    }
    1
}

fn build_instruction(
    mnemonic: &str,
    ops: &[OperandToken],
    line: usize,
    labels: &HashMap<String, u64>,
    pc: u64,
) -> Result<Vec<Instruction>, AssemblyError> {
    match mnemonic {
        // ADD/SUB/AND/ORR/EOR accept either a register or an immediate third
        // operand, dispatching to the register-form or immediate-form opcode;
        // the *I-suffixed spellings below are kept as explicit synonyms,
        // never the sole way to reach the immediate form.
        "ADD" | "SUB" | "AND" | "ORR" | "EOR" => {
            let rd = reg_at(ops, 0, mnemonic, line)?;
            let rn = reg_at(ops, 1, mnemonic, line)?;
            require_same_width(rd, rn, mnemonic, line)?;
            match ops.get(2) {
                Some(OperandToken::Register(rm)) => {
                    require_same_width(rd, *rm, mnemonic, line)?;
                    Ok(vec![Instruction::DataProcReg {
                        op: data_proc_op(mnemonic).unwrap(),
                        rd,
                        rn,
                        rm: *rm,
                        shift: 0,
                    }])
                }
                _ => {
                    let imm = imm_at(ops, 2, mnemonic, line)?;
                    Ok(vec![Instruction::DataProcImm {
                        op: data_proc_op(mnemonic).unwrap(),
                        rd,
                        rn,
                        imm,
                    }])
                }
            }
        }
        "ADDI" | "SUBI" | "ANDI" | "ORRI" | "EORI" => {
            let rd = reg_at(ops, 0, mnemonic, line)?;
            let rn = reg_at(ops, 1, mnemonic, line)?;
            let imm = imm_at(ops, 2, mnemonic, line)?;
            require_same_width(rd, rn, mnemonic, line)?;
            Ok(vec![Instruction::DataProcImm {
                op: data_proc_op(mnemonic).unwrap(),
                rd,
                rn,
                imm,
            }])
        }
        "MOV" | "MOVI" => {
            let rd = reg_at(ops, 0, mnemonic, line)?;
            match ops.get(1) {
                Some(OperandToken::Register(rn)) => {
                    require_same_width(rd, *rn, mnemonic, line)?;
                    Ok(vec![Instruction::MoveReg { rd, rn: *rn }])
                }
                _ => {
                    let imm = imm_at(ops, 1, mnemonic, line)?;
                    Ok(expand_move(rd, imm.value))
                }
            }
        }
        "CMP" | "CMPI" => {
            let rn = reg_at(ops, 0, mnemonic, line)?;
            match ops.get(1) {
                Some(OperandToken::Register(rm)) => {
                    require_same_width(rn, *rm, mnemonic, line)?;
                    Ok(vec![Instruction::Compare {
                        rn,
                        operand: CompareOperand::Reg(*rm),
                    }])
                }
                _ => {
                    let imm = imm_at(ops, 1, mnemonic, line)?;
                    Ok(vec![Instruction::Compare {
                        rn,
                        operand: CompareOperand::Imm(imm),
                    }])
                }
            }
        }
        "MUL" => {
            let rd = reg_at(ops, 0, mnemonic, line)?;
            let rn = reg_at(ops, 1, mnemonic, line)?;
            let rm = reg_at(ops, 2, mnemonic, line)?;
            require_same_width(rd, rn, mnemonic, line)?;
            require_same_width(rd, rm, mnemonic, line)?;
            Ok(vec![Instruction::Multiply { rd, rn, rm }])
        }
        "SDIV" | "UDIV" => {
            let rd = reg_at(ops, 0, mnemonic, line)?;
            let rn = reg_at(ops, 1, mnemonic, line)?;
            let rm = reg_at(ops, 2, mnemonic, line)?;
            require_same_width(rd, rn, mnemonic, line)?;
            require_same_width(rd, rm, mnemonic, line)?;
            Ok(vec![Instruction::Divide {
                signed: mnemonic == "SDIV",
                rd,
                rn,
                rm,
            }])
        }
        "LDRB" | "LDRH" | "LDRW" | "LDRD" | "LDR" => {
            let rt = reg_at(ops, 0, mnemonic, line)?;
            let base = reg_at(ops, 1, mnemonic, line)?;
            let imm = imm_at(ops, 2, mnemonic, line)?;
            Ok(vec![Instruction::LoadStore {
                op: memory_op_for(mnemonic, rt).unwrap(),
                rt,
                mem: MemoryOperand::simple(base, imm),
            }])
        }
        "STRB" | "STRH" | "STRW" | "STRD" | "STR" => {
            let rt = reg_at(ops, 0, mnemonic, line)?;
            let base = reg_at(ops, 1, mnemonic, line)?;
            let imm = imm_at(ops, 2, mnemonic, line)?;
            Ok(vec![Instruction::LoadStore {
                op: memory_op_for(mnemonic, rt).unwrap(),
                rt,
                mem: MemoryOperand::simple(base, imm),
            }])
        }
        "B" => {
            let label = label_at(ops, 0, mnemonic, line)?;
            let target = resolve_label(labels, &label, line)?;
            Ok(vec![Instruction::BranchUncond {
                offset_words: offset_words(pc, target),
            }])
        }
        "BL" => {
            let label = label_at(ops, 0, mnemonic, line)?;
            let target = resolve_label(labels, &label, line)?;
            Ok(vec![Instruction::BranchLink {
                offset_words: offset_words(pc, target),
            }])
        }
        "BR" => Ok(vec![Instruction::BranchReg {
            op: BranchRegOp::Br,
            rn: reg_at(ops, 0, mnemonic, line)?,
        }]),
        "BLR" => Ok(vec![Instruction::BranchReg {
            op: BranchRegOp::Blr,
            rn: reg_at(ops, 0, mnemonic, line)?,
        }]),
        "RET" => {
            let rn = match ops.first() {
                Some(OperandToken::Register(r)) => *r,
                _ => Register::new(Register::LR_NUM, RegWidth::X),
            };
            Ok(vec![Instruction::BranchReg {
                op: BranchRegOp::Ret,
                rn,
            }])
        }
        "NOP" => Ok(vec![Instruction::System { op: crate::enums::SystemOp::Nop }]),
        "HLT" => Ok(vec![Instruction::System { op: crate::enums::SystemOp::Hlt }]),
        _ if mnemonic.starts_with("B.") => {
            let suffix = &mnemonic[2..];
            let cond = BranchCondition::from_mnemonic(suffix).ok_or_else(|| AssemblyError::UnknownMnemonic {
                line,
                mnemonic: mnemonic.to_string(),
            })?;
            let label = label_at(ops, 0, mnemonic, line)?;
            let target = resolve_label(labels, &label, line)?;
            Ok(vec![Instruction::BranchCond {
                cond,
                offset_words: offset_words(pc, target),
            }])
        }
        _ => Err(AssemblyError::UnknownMnemonic {
            line,
            mnemonic: mnemonic.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;

    #[test]
    fn assembles_and_resolves_forward_label() {
        let words = assemble_str("B skip\nHLT\nskip: HLT").unwrap();
        assert_eq!(words.len(), 3);
        match decode(words[0]).unwrap() {
            Instruction::BranchUncond { offset_words } => assert_eq!(offset_words, 1),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn assembles_backward_label_for_loops() {
        let words = assemble_str("loop: SUBI W0, W0, #1\nB loop").unwrap();
        match decode(words[1]).unwrap() {
            Instruction::BranchUncond { offset_words } => assert_eq!(offset_words, -1),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unknown_label_is_an_error() {
        let err = assemble_str("B nowhere").unwrap_err();
        assert_eq!(
            err,
            AssemblyError::UnknownLabel {
                line: 1,
                label: "nowhere".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let err = assemble_str("a: NOP\na: HLT").unwrap_err();
        assert_eq!(
            err,
            AssemblyError::DuplicateLabel {
                line: 2,
                label: "a".to_string(),
            }
        );
    }

    #[test]
    fn unknown_mnemonic_reports_its_line() {
        let err = assemble_str("NOP\nFROB W0").unwrap_err();
        assert_eq!(
            err,
            AssemblyError::UnknownMnemonic {
                line: 2,
                mnemonic: "FROB".to_string(),
            }
        );
    }

    #[test]
    fn str_and_ldr_infer_size_from_register_width() {
        let words = assemble_str("STR X1, [X0, #0]\nLDR W2, [X0, #4]").unwrap();
        match decode(words[0]).unwrap() {
            Instruction::LoadStore { op, .. } => assert_eq!(op, crate::enums::MemoryOp::Strd),
            other => panic!("unexpected: {other:?}"),
        }
        match decode(words[1]).unwrap() {
            Instruction::LoadStore { op, .. } => assert_eq!(op, crate::enums::MemoryOp::Ldrw),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn conditional_branch_mnemonic_is_parsed() {
        let words = assemble_str("B.EQ done\nNOP\ndone: HLT").unwrap();
        match decode(words[0]).unwrap() {
            Instruction::BranchCond { cond, .. } => assert_eq!(cond, BranchCondition::Eq),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn int_and_float_directives_emit_raw_words() {
        let words = assemble_str(".int 42\n.float 1.5").unwrap();
        assert_eq!(words[0], 42);
        assert_eq!(words[1], 1.5f32.to_bits());
    }

    #[test]
    fn ret_defaults_to_link_register() {
        let words = assemble_str("RET").unwrap();
        match decode(words[0]).unwrap() {
            Instruction::BranchReg { op, rn } => {
                assert_eq!(op, BranchRegOp::Ret);
                assert_eq!(rn.number, Register::LR_NUM);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn mismatched_register_widths_are_rejected() {
        let err = assemble_str("ADD X0, W1, W2").unwrap_err();
        assert!(matches!(err, AssemblyError::BadOperand { line: 1, .. }));
    }

    #[test]
    fn mov_with_a_small_constant_assembles_to_one_word() {
        let words = assemble_str("MOV W0, #5").unwrap();
        assert_eq!(words.len(), 1);
    }

    #[test]
    fn mov_with_a_constant_wider_than_16_bits_expands_but_labels_stay_in_sync() {
        // 0xDEADBEEF needs more than one instruction's worth of immediate
        // bits, so `MOV` expands to several words; the label after it must
        // still land on the real next instruction.
        let words = assemble_str("MOV X0, #0xDEADBEEF\nafter: HLT").unwrap();
        assert!(words.len() > 2, "expected a multi-word expansion, got {} words", words.len());
        match decode(*words.last().unwrap()).unwrap() {
            Instruction::System { op } => assert_eq!(op, crate::enums::SystemOp::Hlt),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
