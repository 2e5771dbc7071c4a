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

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tiny64::{assemble_str, Cpu, RunOutcome};

#[derive(Parser)]
#[clap(version = "0.1.0", author = "Connor Nolan")]
struct Opts {
    /// Assembly source file to assemble.
    #[clap(short, long)]
    input: PathBuf,

    /// Load the assembled program and run it to completion instead of just
    /// assembling it.
    #[clap(long)]
    run: bool,

    /// Maximum number of instructions `--run` will execute before giving up
    /// on a program that never reaches `HLT`.
    #[clap(long, default_value_t = 100_000)]
    max_steps: u64,

    /// Print the assembled words (as hex) to stdout.
    #[clap(long)]
    dump_words: bool,
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    let source = fs::read_to_string(&opts.input)
        .with_context(|| format!("failed to read input file: {}", opts.input.display()))?;

    let words = assemble_str(&source)
        .with_context(|| format!("failed to assemble {}", opts.input.display()))?;

    println!(
        "Successfully assembled {} ({} words)",
        opts.input.display(),
        words.len()
    );

    if opts.dump_words {
        for (i, word) in words.iter().enumerate() {
            println!("{:04}: {word:#010x}", i * 4);
        }
    }

    if opts.run {
        let mut cpu = Cpu::new();
        cpu.load_program(&words)?;
        match cpu.run(opts.max_steps) {
            RunOutcome::Halted { steps } => {
                println!("Halted after {steps} step(s)");
            }
            RunOutcome::StepLimitReached { steps } => {
                eprintln!("Did not halt within {steps} steps");
            }
            RunOutcome::Failed { steps, error } => {
                eprintln!("Execution failed after {steps} step(s): {error}");
                return Err(error.into());
            }
        }
        println!("PC:  {:#x}", cpu.get_pc());
        println!("SP:  {:#x}", cpu.get_sp());
        println!("NZCV: {:#06b}", cpu.get_status_reg());
        for (i, value) in cpu.registers().iter().enumerate() {
            println!("X{i:<2} = {value:#018x}");
        }
    }

    Ok(())
}
