//! Diagnostics - fail-soft problem reporting.
//!
//! Nothing in the resolution pipeline throws. A bad spec produces a
//! [`Diagnostic`] which is logged through `tracing` at its severity and
//! appended to a thread-local journal. Embedders can surface the journal in
//! their own UI; tests drain it to assert exactly what was reported.
//!
//! # Example
//!
//! ```ignore
//! use spark_shell::diagnostics::{self, Diagnostic};
//!
//! diagnostics::report(Diagnostic::NullSpec);
//! assert_eq!(diagnostics::error_count(), 1);
//! let reported = diagnostics::take_reported();
//! ```

use std::cell::RefCell;

use thiserror::Error;

// =============================================================================
// Types
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A recoverable problem found while building or updating nodes.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Diagnostic {
    #[error("cannot build a widget from a null spec")]
    NullSpec,

    #[error("there is no widget with type {0}")]
    UnknownType(String),

    #[error("{field} on {kind} has to be {expected}")]
    TypeMismatch {
        kind: String,
        field: String,
        expected: &'static str,
    },

    #[error("{kind} has no field {field}")]
    UnknownField { kind: String, field: String },

    #[error("wrong {field} value: {value}")]
    InvalidValue { field: String, value: String },

    #[error("{kind} should have exactly {expected} children, got {got}")]
    ChildCount {
        kind: String,
        expected: usize,
        got: usize,
    },

    #[error("{field} cannot be expressed as data and was ignored")]
    Unrepresentable { field: String },

    #[error("interval connections need a period above 0ms")]
    ZeroInterval,

    #[error("{0} needs either \"fixed\" or \"monitors\" to be defined")]
    MissingWorkspaceMode(String),

    #[error("show has to be \"class\" or \"title\" on {kind}, got {value}")]
    InvalidShow { kind: String, value: String },

    #[error("node {child} cannot be added under its own descendant {parent}")]
    TreeCycle { parent: usize, child: usize },

    #[error("service {service} failed: {message}")]
    Service { service: String, message: String },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::NullSpec
            | Diagnostic::UnknownType(_)
            | Diagnostic::ChildCount { .. }
            | Diagnostic::MissingWorkspaceMode(_)
            | Diagnostic::TreeCycle { .. } => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

// =============================================================================
// Journal
// =============================================================================

thread_local! {
    static JOURNAL: RefCell<Vec<Diagnostic>> = const { RefCell::new(Vec::new()) };
}

/// Log a diagnostic and record it in the journal.
pub fn report(diagnostic: Diagnostic) {
    match diagnostic.severity() {
        Severity::Error => tracing::error!(%diagnostic, "widget error"),
        Severity::Warning => tracing::warn!(%diagnostic, "widget warning"),
    }
    JOURNAL.with(|journal| journal.borrow_mut().push(diagnostic));
}

/// Drain every diagnostic recorded on this thread.
pub fn take_reported() -> Vec<Diagnostic> {
    JOURNAL.with(|journal| std::mem::take(&mut *journal.borrow_mut()))
}

/// Number of recorded diagnostics with error severity.
pub fn error_count() -> usize {
    JOURNAL.with(|journal| {
        journal
            .borrow()
            .iter()
            .filter(|d| d.severity() == Severity::Error)
            .count()
    })
}

/// Number of recorded diagnostics with warning severity.
pub fn warning_count() -> usize {
    JOURNAL.with(|journal| {
        journal
            .borrow()
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
            .count()
    })
}

/// Clear the journal (for testing).
pub fn reset_diagnostics() {
    JOURNAL.with(|journal| journal.borrow_mut().clear());
}
