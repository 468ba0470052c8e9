// File: src/main.rs
//
// Main entry point for the Ruff programming language interpreter.
// Handles command-line argument parsing and dispatches to the appropriate
// subcommand (run or repl).

mod chunk;
mod compiler;
mod disasm;
mod errors;
mod interner;
mod lexer;
mod repl;
mod value;
mod vm;

use clap::{Parser as ClapParser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(ClapParser)]
#[command(
    name = "ruff",
    about = "Ruff: A modern programming language",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Run a Ruff script file
    Run {
        /// Path to the .ruff file
        file: PathBuf,

        /// Print the compiled bytecode for every function before running
        #[arg(long)]
        dump: bool,
    },

    /// Launch interactive Ruff REPL
    Repl,
}

/// Process exit codes (spec.md §6): 0 success, 65 compile error,
/// 70 runtime error, 64 command-line usage error.
const EXIT_OK: u8 = 0;
const EXIT_COMPILE_ERROR: u8 = 65;
const EXIT_RUNTIME_ERROR: u8 = 70;
const EXIT_USAGE_ERROR: u8 = 64;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, dump } => run_file(&file, dump),
        Commands::Repl => {
            if let Err(e) = repl::Repl::new().run() {
                eprintln!("{} {e}", "REPL error:".red().bold());
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
            ExitCode::from(EXIT_OK)
        }
    }
}

fn run_file(file: &PathBuf, dump: bool) -> ExitCode {
    let source = match fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{} couldn't read '{}': {e}", "Error:".red().bold(), file.display());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let mut vm = vm::Vm::new();
    let function = match compiler::compile(&source, vm.interner_mut()) {
        Ok(function) => function,
        Err(errors) => {
            for error in errors {
                eprintln!("{error}");
            }
            return ExitCode::from(EXIT_COMPILE_ERROR);
        }
    };

    if dump {
        print!("{}", disasm::disassemble_chunk(&function.chunk, "script"));
    }

    match vm.interpret(function) {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(error) => {
            eprintln!("{error}");
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}
