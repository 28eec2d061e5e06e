//! Compile-time error reporting and diagnostics.
//!
//! Errors are structured diagnostics with a source location, a message and
//! optional secondary labels and hints.
//!
//! # Design
//!
//! - `CompileError` — single diagnostic with primary and optional secondary spans
//! - `ErrorKind` — categorizes errors by compiler phase
//! - `Severity` — error, warning, or note
//!
//! Construction-time and unification failures abort the whole compilation;
//! no partial artifact is ever emitted. Pipeline stages therefore return
//! `Result<T, Vec<CompileError>>` and accumulate before bailing out.

use crate::foundation::{Span, TypeError};
use std::fmt;

/// Compilation diagnostic with source location and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Category of this error
    pub kind: ErrorKind,
    /// Severity level
    pub severity: Severity,
    /// Primary source location
    pub span: Span,
    /// Primary error message
    pub message: String,
    /// Additional labeled spans
    pub labels: Vec<Label>,
    /// Additional notes or hints
    pub notes: Vec<String>,
}

/// Category of compilation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An event name was declared twice
    DuplicateDeclaration,
    /// Unification failed to merge two concrete types
    IncompatibleTypes,
    /// A method lookup on a module or typed value failed
    UnresolvedMethod,
    /// Event construction with a parameter count mismatched to the
    /// declaration's field count
    MalformedArity,
    /// Reference to a type (or event) that was never declared
    UnknownType,
    /// The checker's fixed point failed to converge within the pass cap
    CheckerDiverged,
    /// The code generator could not express a type or declaration
    Codegen,
    /// Internal compiler error (bug in the compiler)
    Internal,
}

impl ErrorKind {
    /// Human-readable name for this error kind.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::DuplicateDeclaration => "duplicate declaration",
            ErrorKind::IncompatibleTypes => "incompatible types",
            ErrorKind::UnresolvedMethod => "unresolved method",
            ErrorKind::MalformedArity => "malformed arity",
            ErrorKind::UnknownType => "unknown type",
            ErrorKind::CheckerDiverged => "type checker diverged",
            ErrorKind::Codegen => "code generation error",
            ErrorKind::Internal => "internal compiler error",
        }
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational note (not an error)
    Note,
    /// Warning (compilation can proceed)
    Warning,
    /// Error (compilation cannot proceed)
    Error,
}

/// Secondary labeled span in a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Source location
    pub span: Span,
    /// Label text
    pub message: String,
}

impl CompileError {
    /// Creates a new error diagnostic.
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self::with_severity(kind, Severity::Error, span, message)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(kind: ErrorKind, span: Span, message: String) -> Self {
        Self::with_severity(kind, Severity::Warning, span, message)
    }

    /// Creates a new note diagnostic.
    pub fn note(kind: ErrorKind, span: Span, message: String) -> Self {
        Self::with_severity(kind, Severity::Note, span, message)
    }

    fn with_severity(kind: ErrorKind, severity: Severity, span: Span, message: String) -> Self {
        Self {
            kind,
            severity,
            span,
            message,
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Wraps a unification failure, attaching the offending node's span.
    pub fn incompatible(err: TypeError, span: Span) -> Self {
        let kind = match err {
            TypeError::Incompatible { .. } => ErrorKind::IncompatibleTypes,
            TypeError::NotIterable(_) => ErrorKind::IncompatibleTypes,
        };
        Self::new(kind, span, err.to_string())
    }

    /// Adds a secondary labeled span.
    pub fn with_label(mut self, span: Span, message: String) -> Self {
        self.labels.push(Label { span, message });
        self
    }

    /// Adds a note or hint.
    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.severity,
            self.kind.name(),
            self.message
        )
    }
}

impl std::error::Error for CompileError {}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Formats a batch of diagnostics, one per line, with labels and notes
/// indented beneath their diagnostic.
///
/// Source snippets are owned by the driver layer; this formatter only
/// renders what the core knows (kind, message, line numbers).
pub fn format_errors(errors: &[CompileError]) -> String {
    let mut output = String::new();
    for error in errors {
        output.push_str(&format!(
            "{} (line {})\n",
            error,
            error.span.start_line
        ));
        for label in &error.labels {
            output.push_str(&format!(
                "   = note: {} (line {})\n",
                label.message, label.span.start_line
            ));
        }
        for note in &error.notes {
            output.push_str(&format!("   = help: {}\n", note));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_span() -> Span {
        Span::new(0, 0, 5, 1)
    }

    #[test]
    fn test_error_creation() {
        let err = CompileError::new(
            ErrorKind::DuplicateDeclaration,
            dummy_span(),
            "repeated declaration of event 'A'".to_string(),
        );

        assert_eq!(err.kind, ErrorKind::DuplicateDeclaration);
        assert_eq!(err.severity, Severity::Error);
        assert!(err.labels.is_empty());
        assert!(err.notes.is_empty());
    }

    #[test]
    fn test_warning_creation() {
        let warn = CompileError::warning(
            ErrorKind::UnresolvedMethod,
            dummy_span(),
            "type map read before type checking".to_string(),
        );
        assert_eq!(warn.severity, Severity::Warning);
    }

    #[test]
    fn test_error_chaining() {
        let err = CompileError::new(
            ErrorKind::DuplicateDeclaration,
            dummy_span(),
            "repeated declaration of event 'A'".to_string(),
        )
        .with_label(dummy_span(), "first declared here".to_string())
        .with_note("rename one of the events".to_string());

        assert_eq!(err.labels.len(), 1);
        assert_eq!(err.notes.len(), 1);
    }

    #[test]
    fn test_incompatible_wraps_type_error() {
        let unify_err = crate::foundation::Type::Bool
            .unify(&crate::foundation::Type::String)
            .unwrap_err();
        let err = CompileError::incompatible(unify_err, dummy_span());
        assert_eq!(err.kind, ErrorKind::IncompatibleTypes);
        assert!(err.message.contains("Bool"));
        assert!(err.message.contains("String"));
    }

    #[test]
    fn test_format_errors() {
        let errors = vec![
            CompileError::new(
                ErrorKind::IncompatibleTypes,
                Span::new(0, 10, 14, 3),
                "cannot unify `Bool` with `Int32`".to_string(),
            )
            .with_note("the operand was first typed here".to_string()),
            CompileError::new(
                ErrorKind::UnknownType,
                dummy_span(),
                "no declaration for event 'C'".to_string(),
            ),
        ];

        let out = format_errors(&errors);
        assert!(out.contains("incompatible types"));
        assert!(out.contains("line 3"));
        assert!(out.contains("help: the operand"));
        assert!(out.contains("unknown type"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Note < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }
}
