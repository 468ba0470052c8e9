// File: src/repl.rs
//
// Interactive REPL (Read-Eval-Print Loop) for the Ruff programming language.
// Each complete line is compiled and run independently against one
// persistent `Vm`: globals survive across lines, but the value and frame
// stacks are reset to empty before every line (spec.md §7).

use crate::compiler;
use crate::vm::Vm;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub struct Repl {
    vm: Vm,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new() -> Self {
        let editor = DefaultEditor::new().expect("line editor initializes");
        Repl { vm: Vm::new(), editor }
    }

    fn show_banner(&self) {
        println!("{}", "╔══════════════════════════════════════════════════════╗".bright_cyan());
        println!("{}", "║              Ruff REPL - Interactive Shell            ║".bright_cyan());
        println!("{}", "╚══════════════════════════════════════════════════════╝".bright_cyan());
        println!();
        println!(
            "  {} Leave a '{{' unclosed to keep typing a block; Ctrl+D to exit.",
            "Tip:".bright_magenta()
        );
        println!();
    }

    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.show_banner();

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() {
                "ruff> ".bright_green().to_string()
            } else {
                "....> ".bright_blue().to_string()
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());

                    buffer.push_str(&line);
                    buffer.push('\n');

                    if Self::braces_balanced(&buffer) {
                        self.eval_line(&buffer);
                        buffer.clear();
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C (Ctrl+C to interrupt, Ctrl+D to exit)".bright_yellow());
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "Goodbye!".bright_cyan());
                    break;
                }
                Err(err) => {
                    eprintln!("{} {err}", "Error:".bright_red());
                    break;
                }
            }
        }

        Ok(())
    }

    /// True once every `{` opened outside a string/comment has a matching
    /// `}` — the same signal the teacher's REPL used to decide when a
    /// multi-line `fun`/`if`/`while` body is ready to run.
    fn braces_balanced(input: &str) -> bool {
        let mut depth: i32 = 0;
        let mut in_string = false;
        let mut chars = input.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '"' => in_string = !in_string,
                '{' if !in_string => depth += 1,
                '}' if !in_string => depth -= 1,
                '/' if !in_string && chars.peek() == Some(&'/') => {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => {}
            }
        }
        depth <= 0
    }

    fn eval_line(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }

        self.vm.reset_stacks();
        match compiler::compile(input, self.vm.interner_mut()) {
            Ok(function) => {
                if let Err(error) = self.vm.interpret(function) {
                    println!("{error}");
                }
            }
            Err(errors) => {
                for error in errors {
                    println!("{error}");
                }
            }
        }
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}
