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

//! Two-pass assembler and fetch/decode/execute simulator for a small
//! AArch64-like teaching ISA. `assembler::assemble_str` turns source text
//! into a flat `Vec<u32>` word program; `Cpu` loads that program and steps
//! it one instruction at a time.

pub mod alu;
pub mod assembler;
pub mod consts;
pub mod cpu;
pub mod decoder;
pub mod enums;
pub mod errors;
pub mod execute;
pub mod instruction;
pub mod memory;
pub mod registers;
pub mod types;

pub use assembler::{assemble_lines, assemble_str};
pub use cpu::{Cpu, RunOutcome};
pub use errors::{AssemblyError, DecodeError, ExecError};
