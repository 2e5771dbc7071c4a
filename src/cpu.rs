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

//! The public fetch-decode-execute façade: a thin struct tying together the
//! register file, flags, memory, and program counter.

use crate::decoder::decode;
use crate::errors::ExecError;
use crate::execute::{execute, ExecState};
use crate::memory::Memory;
use crate::registers::{Flags, RegisterFile};

pub struct Cpu {
    regs: RegisterFile,
    flags: Flags,
    memory: Memory,
    pc: u64,
    ir: u32,
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            regs: RegisterFile::new(),
            flags: Flags::default(),
            memory: Memory::new(),
            pc: 0,
            ir: 0,
        }
    }

    /// Resets registers, flags, memory and the PC to their power-on state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.flags = Flags::default();
        self.memory.reset();
        self.pc = 0;
        self.ir = 0;
    }

    /// Loads `words` at address 0 and resets the PC to the start of the
    /// program.
    pub fn load_program(&mut self, words: &[u32]) -> Result<(), ExecError> {
        self.memory.reset();
        self.memory.load_program(words)?;
        self.pc = 0;
        Ok(())
    }

    /// Fetches the word at `pc`, advances `pc` by 4 (so branch targets are
    /// relative to the *next* instruction), decodes it, and executes it.
    /// Returns `Err(ExecError::Halted)` on `HLT`, which callers treat as
    /// ordinary termination rather than failure.
    pub fn step(&mut self) -> Result<(), ExecError> {
        let word = self.memory.read_u32(self.pc)?;
        self.ir = word;
        self.pc = self.pc.wrapping_add(4);
        let instr = decode(word)?;
        let mut state = ExecState {
            regs: &mut self.regs,
            flags: &mut self.flags,
            memory: &mut self.memory,
            pc: &mut self.pc,
        };
        execute(&instr, &mut state)
    }

    /// Runs `step` until `HLT`, an error, or `max_steps` instructions have
    /// executed, whichever comes first.
    pub fn run(&mut self, max_steps: u64) -> RunOutcome {
        for taken in 0..max_steps {
            match self.step() {
                Ok(()) => continue,
                Err(ExecError::Halted) => return RunOutcome::Halted { steps: taken + 1 },
                Err(error) => return RunOutcome::Failed { steps: taken + 1, error },
            }
        }
        RunOutcome::StepLimitReached { steps: max_steps }
    }

    pub fn get_reg(&self, number: u8) -> Result<u64, ExecError> {
        self.regs.read_x(number)
    }

    pub fn get_pc(&self) -> u64 {
        self.pc
    }

    pub fn get_sp(&self) -> u64 {
        self.regs.sp()
    }

    pub fn get_ir(&self) -> u32 {
        self.ir
    }

    pub fn get_status_reg(&self) -> u32 {
        self.flags.as_status_word()
    }

    pub fn get_memory(&self) -> &[u8] {
        self.memory.snapshot()
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Read-only access to the full register bank, widest form, `R0..R31`.
    pub fn registers(&self) -> [u64; 32] {
        let mut out = [0u64; 32];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.regs.read_x(i as u8).expect("i is always < 32");
        }
        out
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Cpu::new()
    }
}

/// The result of running a program to completion or to its step budget.
#[derive(Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// `HLT` was reached after `steps` instructions.
    Halted { steps: u64 },
    /// `max_steps` instructions ran without reaching `HLT`.
    StepLimitReached { steps: u64 },
    /// Execution failed after `steps` instructions.
    Failed { steps: u64, error: ExecError },
}

impl RunOutcome {
    pub fn steps(&self) -> u64 {
        match self {
            RunOutcome::Halted { steps }
            | RunOutcome::StepLimitReached { steps }
            | RunOutcome::Failed { steps, .. } => *steps,
        }
    }
}
