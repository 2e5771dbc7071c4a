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

//! The three error families. Each carries enough context to point the
//! caller back at the offending source line, decoded word, or faulting
//! address/register.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("line {line}: unknown mnemonic `{mnemonic}`")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("line {line}: unknown label `{label}`")]
    UnknownLabel { line: usize, label: String },

    #[error("line {line}: bad operand `{token}`: {reason}")]
    BadOperand {
        line: usize,
        token: String,
        reason: String,
    },

    #[error("line {line}: too few operands for `{mnemonic}` (expected {expected}, got {got})")]
    TooFewOperands {
        line: usize,
        mnemonic: String,
        expected: usize,
        got: usize,
    },

    #[error("line {line}: duplicate label `{label}`")]
    DuplicateLabel { line: usize, label: String },

    #[error("line {line}: bad register name `{token}`")]
    BadRegisterName { line: usize, token: String },
}

impl AssemblyError {
    pub fn line(&self) -> usize {
        match self {
            AssemblyError::UnknownMnemonic { line, .. }
            | AssemblyError::UnknownLabel { line, .. }
            | AssemblyError::BadOperand { line, .. }
            | AssemblyError::TooFewOperands { line, .. }
            | AssemblyError::DuplicateLabel { line, .. }
            | AssemblyError::BadRegisterName { line, .. } => *line,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown opcode {0}")]
    UnknownOpcode(u32),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("memory access out of bounds at address {0:#x}")]
    MemoryOutOfBounds(u64),

    #[error("invalid register number {0}")]
    InvalidRegister(u8),

    /// Sentinel for `HLT`. Callers treat this as normal termination, not a
    /// failure.
    #[error("halted")]
    Halted,

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
