// File: src/errors.rs
//
// Error handling and reporting for the Ruff programming language.
// Structured error types with source-line information and a
// pretty-printed, colored `Display` impl — the two separate taxonomies
// from spec §7 (compile-time vs. runtime) share this one rendering.

use colored::Colorize;
use std::fmt;

/// A source line, used for both compile-time diagnostics (from the
/// scanner/compiler) and runtime diagnostics (from the VM's current frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
}

impl SourceLocation {
    pub fn new(line: usize) -> Self {
        Self { line }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Compile,
    Runtime,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Compile => write!(f, "Compile Error"),
            ErrorKind::Runtime => write!(f, "Runtime Error"),
        }
    }
}

/// A structured error with location information and, for runtime errors,
/// the call stack active at the point of failure (spec §4.E: "one message
/// plus a stack trace").
#[derive(Debug, Clone)]
pub struct RuffError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: SourceLocation,
    /// One entry per active frame, innermost first, formatted as
    /// `[line L] in NAME` — empty for compile errors.
    pub call_stack: Vec<String>,
}

impl RuffError {
    pub fn compile_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self { kind: ErrorKind::Compile, message: message.into(), location, call_stack: Vec::new() }
    }

    pub fn runtime_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self { kind: ErrorKind::Runtime, message: message.into(), location, call_stack: Vec::new() }
    }

    pub fn with_call_stack(mut self, call_stack: Vec<String>) -> Self {
        self.call_stack = call_stack;
        self
    }
}

impl fmt::Display for RuffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.kind.to_string().red().bold(), self.message.bold())?;
        writeln!(f, "{}", format!("  --> {}", self.location).bright_blue())?;
        for frame in &self.call_stack {
            writeln!(f, "{}", frame.dimmed())?;
        }
        Ok(())
    }
}

impl std::error::Error for RuffError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_renders_kind_message_and_frames() {
        let err = RuffError::runtime_error("Undefined variable 'x'.", SourceLocation::new(3))
            .with_call_stack(vec!["[line 3] in main()".to_string()]);
        let rendered = format!("{err}");
        assert!(rendered.contains("Undefined variable 'x'."));
        assert!(rendered.contains("[line 3] in main()"));
    }
}
