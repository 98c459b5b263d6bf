// This module defines the error surface of dagsel using the thiserror crate. CompileError
// is the root-cause enum: unsupported patterns found by instruction selection, illegal
// node types rejected by validation, malformed selection rules, malformed bytecode and
// internal invariant violations. Diagnostic wraps a CompileError with the triage data a
// fatal report needs: the originating submodule, the failing pass, the source location
// that raised it (captured with #[track_caller]), free-text notes added while it
// propagates, and a captured backtrace. PassResult<T> is the Result alias threaded
// through every pass and pipeline. Invariant violations are not values: the invariant!
// macro logs the full report and panics, because they indicate an engine bug.

//! Error types and diagnostics.
//!
//! Using thiserror for the root-cause enums.

use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;

use thiserror::Error;

use super::dag::NodeId;
use crate::bytecode::BytecodeError;

/// Fixed diagnostic category attached to every error for triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Submodule {
    Jit,
    RawExec,
    Opt,
    Isel,
    Lower,
    Misc,
}

impl fmt::Display for Submodule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Submodule::Jit => "JIT",
            Submodule::RawExec => "RAW_EXEC",
            Submodule::Opt => "OPT",
            Submodule::Isel => "ISEL",
            Submodule::Lower => "LOWER",
            Submodule::Misc => "MISC",
        })
    }
}

/// Root cause of a failed compilation step.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("no selection rule matches node {node} ({opcode})")]
    UnsupportedPattern { node: NodeId, opcode: String },

    #[error("illegal {reason} type {ty} on node {node}")]
    IllegalType {
        node: NodeId,
        ty: String,
        reason: &'static str,
    },

    #[error("invalid selection rule for {opcode}: {reason}")]
    InvalidRule { opcode: String, reason: String },

    #[error("malformed bytecode: {0}")]
    Bytecode(#[from] BytecodeError),

    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

impl CompileError {
    /// The node this error is about, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            CompileError::UnsupportedPattern { node, .. } | CompileError::IllegalType { node, .. } => Some(*node),
            _ => None,
        }
    }
}

/// A fatal diagnostic: root cause plus the context needed to report it.
#[derive(Debug)]
pub struct Diagnostic {
    error: CompileError,
    submodule: Submodule,
    pass: Option<String>,
    location: &'static Location<'static>,
    notes: Vec<String>,
    backtrace: Backtrace,
}

/// Result type threaded through passes and pipelines.
pub type PassResult<T> = Result<T, Diagnostic>;

impl Diagnostic {
    /// Create a diagnostic located at the caller.
    #[track_caller]
    pub fn new(error: impl Into<CompileError>, submodule: Submodule) -> Self {
        Self {
            error: error.into(),
            submodule,
            pass: None,
            location: Location::caller(),
            notes: Vec::new(),
            backtrace: Backtrace::capture(),
        }
    }

    /// Record the pass that failed.
    pub fn in_pass(mut self, pass: impl Into<String>) -> Self {
        self.pass = Some(pass.into());
        self
    }

    /// Append a note without touching the root cause.
    pub fn add_note(&mut self, note: impl Into<String>) -> &mut Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.add_note(note);
        self
    }

    pub fn error(&self) -> &CompileError {
        &self.error
    }

    pub fn into_error(self) -> CompileError {
        self.error
    }

    pub fn submodule(&self) -> Submodule {
        self.submodule
    }

    pub fn pass(&self) -> Option<&str> {
        self.pass.as_deref()
    }

    pub fn node(&self) -> Option<NodeId> {
        self.error.node()
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Multi-line fatal error report.
    pub fn report(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Fatal Error: {}\n", self.error));
        out.push_str(&format!(
            "In {}:{}:{}\n",
            self.location.file(),
            self.location.line(),
            self.location.column()
        ));
        out.push_str(&format!("In submodule {}\n", self.submodule));
        if let Some(pass) = &self.pass {
            out.push_str(&format!("In pass {pass}\n"));
        }
        out.push_str("Notes:\n");
        for (index, note) in self.notes.iter().enumerate() {
            out.push_str(&format!("{index}: {note}\n"));
        }
        out.push_str(&format!("\nStacktrace:\n{}\n", self.backtrace));
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.submodule)?;
        if let Some(pass) = &self.pass {
            write!(f, "{pass}: ")?;
        }
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for Diagnostic {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Report an engine bug and abort the current compilation by panicking.
#[cold]
#[track_caller]
pub fn invariant_failed(submodule: Submodule, message: String) -> ! {
    let diagnostic = Diagnostic::new(CompileError::Invariant(message), submodule);
    let report = diagnostic.report();
    log::error!("{report}");
    panic!("{report}");
}

/// Check an internal invariant; on failure print the full diagnostic and panic.
#[macro_export]
macro_rules! invariant {
    ($submodule:expr, $cond:expr, $($arg:tt)+) => {
        if !($cond) {
            $crate::core::error::invariant_failed($submodule, format!($($arg)+))
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notes_keep_root_cause() {
        let diag = Diagnostic::new(
            CompileError::UnsupportedPattern {
                node: NodeId(4),
                opcode: "MUL".to_string(),
            },
            Submodule::Isel,
        )
        .in_pass("cg::x86::isel")
        .with_note("while selecting function 0");

        assert!(matches!(diag.error(), CompileError::UnsupportedPattern { .. }));
        assert_eq!(diag.node(), Some(NodeId(4)));
        assert_eq!(diag.notes(), ["while selecting function 0".to_string()]);
        assert_eq!(diag.to_string(), "[ISEL] cg::x86::isel: no selection rule matches node %4 (MUL)");
    }

    #[test]
    fn test_report_layout() {
        let diag = Diagnostic::new(CompileError::Invariant("x".into()), Submodule::Misc).with_note("first");
        let report = diag.report();
        assert!(report.starts_with("Fatal Error: internal invariant violated: x\n"));
        assert!(report.contains("In submodule MISC\n"));
        assert!(report.contains("0: first\n"));
        assert!(report.contains(file!()));
    }

    #[test]
    #[should_panic(expected = "internal invariant violated: bad id 7")]
    fn test_invariant_panics() {
        crate::invariant!(Submodule::Misc, 1 + 1 == 3, "bad id {}", 7);
    }
}
