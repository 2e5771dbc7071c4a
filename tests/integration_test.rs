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

use tiny64::{assemble_str, Cpu, RunOutcome};

fn run_to_halt(source: &str) -> Cpu {
    let words = assemble_str(source).expect("program must assemble");
    let mut cpu = Cpu::new();
    cpu.load_program(&words).expect("program must fit in memory");
    match cpu.run(10_000) {
        RunOutcome::Halted { .. } => cpu,
        other => panic!("expected HLT, got {other:?}"),
    }
}

#[test]
fn arithmetic() {
    let cpu = run_to_halt("MOV W0,#5\nMOV W1,#3\nADD W2,W0,W1\nHLT");
    assert_eq!(cpu.get_reg(2).unwrap(), 8);
    assert!(!cpu.flags().z);
}

#[test]
fn branch_taken() {
    let cpu = run_to_halt("MOV W0,#1\nCMP W0,#1\nB.EQ L\nMOV W0,#99\nL: HLT");
    assert_eq!(cpu.get_reg(0).unwrap(), 1);
}

#[test]
fn branch_not_taken() {
    let cpu = run_to_halt("MOV W0,#2\nCMP W0,#1\nB.EQ L\nMOV W0,#99\nL: HLT");
    assert_eq!(cpu.get_reg(0).unwrap(), 99);
}

#[test]
fn load_store_round_trip() {
    let cpu = run_to_halt("MOV X0,#0x100\nMOV X1,#0xDEADBEEF\nSTR X1,[X0,#0]\nLDR X2,[X0,#0]\nHLT");
    assert_eq!(cpu.get_reg(2).unwrap(), 0xDEADBEEF);
}

#[test]
fn function_call() {
    let cpu = run_to_halt("BL F\nHLT\nF: ADD X0,X0,#1\nRET");
    assert_eq!(cpu.get_reg(0).unwrap(), 1);
    assert_eq!(cpu.get_reg(30).unwrap(), 4); // X30 (LR) points at the HLT
    assert_eq!(cpu.get_pc(), 4);
}

#[test]
fn fibonacci_loop_fifty_steps() {
    // X0 = F(n-1), X1 = F(n), X2 = loop counter. Each iteration: X2 = X0+X1,
    // X0 = X1, X1 = X2, decrement the counter, loop while nonzero.
    let source = "\
        MOV X0,#0\n\
        MOV X1,#1\n\
        MOV X3,#49\n\
        loop: ADD X2,X0,X1\n\
        MOV X0,X1\n\
        MOV X1,X2\n\
        SUB X3,X3,#1\n\
        CMP X3,#0\n\
        B.NE loop\n\
        HLT";
    let cpu = run_to_halt(source);
    assert_eq!(cpu.get_reg(1).unwrap(), 12586269025);
}

#[test]
fn halting_on_divide_by_zero_reports_the_failure() {
    let words = assemble_str("MOV W0,#1\nMOV W1,#0\nUDIV W2,W0,W1\nHLT").unwrap();
    let mut cpu = Cpu::new();
    cpu.load_program(&words).unwrap();
    match cpu.run(10) {
        RunOutcome::Failed { error, .. } => {
            assert_eq!(error, tiny64::ExecError::DivisionByZero);
        }
        other => panic!("expected a division-by-zero failure, got {other:?}"),
    }
}

#[test]
fn a_program_that_never_halts_stops_at_the_step_budget() {
    let words = assemble_str("loop: NOP\nB loop").unwrap();
    let mut cpu = Cpu::new();
    cpu.load_program(&words).unwrap();
    assert_eq!(cpu.run(1_000), RunOutcome::StepLimitReached { steps: 1_000 });
}

#[test]
fn w_register_writes_zero_extend_into_the_full_x_slot() {
    let cpu = run_to_halt("MOV X0,#-1\nMOV W0,#1\nHLT");
    assert_eq!(cpu.get_reg(0).unwrap(), 1);
}

#[test]
fn unknown_mnemonic_fails_assembly_before_any_execution() {
    let err = assemble_str("FROBNICATE W0").unwrap_err();
    assert_eq!(err.line(), 1);
}

#[test]
fn out_of_bounds_memory_access_is_reported_and_does_not_panic() {
    // Immediates are 16 bits wide, so a 1 MiB address has to be built up by
    // repeated doubling rather than loaded in one instruction.
    let mut source = String::from("MOV X0,#1\n");
    for _ in 0..20 {
        source.push_str("ADD X0,X0,X0\n"); // X0 *= 2, twenty times => 2^20 == MEM_SIZE
    }
    source.push_str("MOV X1,#1\nSTRB X1,[X0,#0]\nHLT");

    let words = assemble_str(&source).unwrap();
    let mut cpu = Cpu::new();
    cpu.load_program(&words).unwrap();
    match cpu.run(50) {
        RunOutcome::Failed { error, .. } => {
            assert!(matches!(error, tiny64::ExecError::MemoryOutOfBounds(_)));
        }
        other => panic!("expected an out-of-bounds failure, got {other:?}"),
    }
}
