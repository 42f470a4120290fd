//! Rewrite diagnostics
//!
//! Constructs the lowering cannot express are not silently passed through.
//! Each one is recorded here and lowered to a failing operation, so the
//! program still runs up to the point where it would have broken.

use serde::Serialize;
use std::fmt;

/// What went wrong with a construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A statement the parser could not make sense of
    ParseFailure,
    /// A recognized construct the executor does not model
    Unsupported,
    /// A call to a name that no function definition provides
    UnknownFunction,
    /// A function defined more than once; the last definition wins
    DuplicateFunction,
}

impl DiagnosticKind {
    /// Diagnostics that turn into a failing operation
    pub fn is_error(self) -> bool {
        matches!(self, DiagnosticKind::ParseFailure | DiagnosticKind::Unsupported)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticKind::ParseFailure => "parse failure",
            DiagnosticKind::Unsupported => "unsupported",
            DiagnosticKind::UnknownFunction => "unknown function",
            DiagnosticKind::DuplicateFunction => "duplicate function",
        };
        f.write_str(label)
    }
}

/// One rewrite diagnostic, tied to a source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: usize, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            line,
            kind,
            message: message.into(),
        }
    }

    pub fn severity(&self) -> &'static str {
        if self.kind.is_error() {
            "error"
        } else {
            "warning"
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: {} ({}): {}",
            self.line,
            self.severity(),
            self.kind,
            self.message
        )
    }
}
