//! Analysis-time diagnostics for conservative typing decisions.
//!
//! This module provides optional warnings for the places where the
//! analysis gives up precision, helping users understand when and why a
//! value ends up at `Object` or `top`.
//!
//! # Overview
//!
//! The analysis widens conservatively in a few situations:
//! - A class in the hierarchy has no definition (missing class)
//! - A least upper bound walk runs through a missing definition and
//!   answers `Object`
//! - An array read sees a receiver that is not an array type
//! - An instruction the analysis has no transfer function for
//!
//! Collecting these events shows where the input program kept the
//! analysis from proving anything useful.
//!
//! # Usage
//!
//! Diagnostics are disabled by default to avoid noisy output. Enable them
//! via:
//! - `DiagnosticsCollector::enable()` - enable diagnostics collection
//! - `DiagnosticsCollector::disable()` - disable diagnostics collection
//! - `DiagnosticsCollector::take()` - retrieve and clear collected
//!   diagnostics

use std::cell::RefCell;

/// Reason the analysis settled for a conservative answer.
#[derive(Clone, Debug, PartialEq)]
pub enum DiagnosticReason {
    /// A referenced class has no definition in the hierarchy.
    /// Contains the class name.
    MissingClass(String),

    /// A least upper bound of two classes answered `Object` because a
    /// definition along one chain is missing.
    /// Contains the two class names.
    ConservativeClassLub(String, String),

    /// An array read whose receiver is not an array type.
    /// Contains the rendered receiver type.
    ImpreciseArrayAccess(String),

    /// An instruction with no transfer function; its output is `top`.
    OpaqueInstruction,
}

impl std::fmt::Display for DiagnosticReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticReason::MissingClass(name) => {
                write!(f, "missing class '{}'", name)
            }
            DiagnosticReason::ConservativeClassLub(a, b) => {
                write!(
                    f,
                    "least upper bound of '{}' and '{}' fell back to Object",
                    a, b
                )
            }
            DiagnosticReason::ImpreciseArrayAccess(ty) => {
                write!(f, "array read from a value of type {}", ty)
            }
            DiagnosticReason::OpaqueInstruction => {
                write!(f, "opaque instruction typed as top")
            }
        }
    }
}

/// A single analysis diagnostic (warning).
#[derive(Clone, Debug)]
pub struct AnalysisDiagnostic {
    /// The reason for the precision loss.
    pub reason: DiagnosticReason,
    /// Optional method or value name associated with this diagnostic.
    pub context: Option<String>,
}

impl AnalysisDiagnostic {
    /// Create a new diagnostic.
    pub fn new(reason: DiagnosticReason) -> Self {
        Self {
            reason,
            context: None,
        }
    }

    /// Add context (method/value name) to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl std::fmt::Display for AnalysisDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type analysis warning: {}", self.reason)?;
        if let Some(ctx) = &self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}

// Thread-local storage for diagnostics collector state
thread_local! {
    static DIAGNOSTICS_ENABLED: RefCell<bool> = const { RefCell::new(false) };
    static DIAGNOSTICS: RefCell<Vec<AnalysisDiagnostic>> = const { RefCell::new(Vec::new()) };
}

/// Collector for analysis diagnostics.
///
/// Uses thread-local storage to collect diagnostics during analysis.
/// Disabled by default to avoid overhead and noisy output.
#[derive(Debug)]
pub struct DiagnosticsCollector;

impl DiagnosticsCollector {
    /// Enable diagnostics collection.
    pub fn enable() {
        DIAGNOSTICS_ENABLED.with(|enabled| {
            *enabled.borrow_mut() = true;
        });
    }

    /// Disable diagnostics collection.
    pub fn disable() {
        DIAGNOSTICS_ENABLED.with(|enabled| {
            *enabled.borrow_mut() = false;
        });
    }

    /// Check if diagnostics collection is enabled.
    pub fn is_enabled() -> bool {
        DIAGNOSTICS_ENABLED.with(|enabled| *enabled.borrow())
    }

    /// Add a diagnostic to the collection (if enabled).
    pub fn emit(diagnostic: AnalysisDiagnostic) {
        if Self::is_enabled() {
            DIAGNOSTICS.with(|diags| {
                diags.borrow_mut().push(diagnostic);
            });
        }
    }

    /// Take all collected diagnostics, clearing the collection.
    pub fn take() -> Vec<AnalysisDiagnostic> {
        DIAGNOSTICS.with(|diags| std::mem::take(&mut *diags.borrow_mut()))
    }

    /// Clear all collected diagnostics without returning them.
    pub fn clear() {
        DIAGNOSTICS.with(|diags| {
            diags.borrow_mut().clear();
        });
    }

    /// Get the number of collected diagnostics.
    pub fn count() -> usize {
        DIAGNOSTICS.with(|diags| diags.borrow().len())
    }
}

/// Helper function to emit a missing class diagnostic.
pub fn emit_missing_class(class_name: &str) {
    DiagnosticsCollector::emit(AnalysisDiagnostic::new(DiagnosticReason::MissingClass(
        class_name.to_string(),
    )));
}

/// Helper function to emit a conservative class lub diagnostic.
pub fn emit_conservative_class_lub(a: &str, b: &str) {
    DiagnosticsCollector::emit(AnalysisDiagnostic::new(
        DiagnosticReason::ConservativeClassLub(a.to_string(), b.to_string()),
    ));
}

/// Helper function to emit an imprecise array access diagnostic.
pub fn emit_imprecise_array_access(receiver_type: &str) {
    DiagnosticsCollector::emit(AnalysisDiagnostic::new(
        DiagnosticReason::ImpreciseArrayAccess(receiver_type.to_string()),
    ));
}

/// Helper function to emit an opaque instruction diagnostic.
pub fn emit_opaque_instruction() {
    DiagnosticsCollector::emit(AnalysisDiagnostic::new(
        DiagnosticReason::OpaqueInstruction,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_disabled_by_default() {
        // Clear any existing state
        DiagnosticsCollector::disable();
        DiagnosticsCollector::clear();

        assert!(!DiagnosticsCollector::is_enabled());

        // Emit should be a no-op when disabled
        emit_missing_class("com.example.Gone");
        assert_eq!(DiagnosticsCollector::count(), 0);
    }

    #[test]
    fn test_diagnostic_collection() {
        DiagnosticsCollector::enable();
        DiagnosticsCollector::clear();

        emit_missing_class("com.example.A");
        emit_conservative_class_lub("com.example.A", "com.example.B");

        assert_eq!(DiagnosticsCollector::count(), 2);

        let diags = DiagnosticsCollector::take();
        assert_eq!(diags.len(), 2);
        assert_eq!(DiagnosticsCollector::count(), 0); // Should be cleared

        // Check first diagnostic
        assert!(matches!(
            &diags[0].reason,
            DiagnosticReason::MissingClass(name) if name == "com.example.A"
        ));

        DiagnosticsCollector::disable();
    }

    #[test]
    fn test_diagnostic_reason_display() {
        assert_eq!(
            DiagnosticReason::MissingClass("com.example.Gone".to_string()).to_string(),
            "missing class 'com.example.Gone'"
        );
        assert_eq!(
            DiagnosticReason::ConservativeClassLub("A".to_string(), "B".to_string()).to_string(),
            "least upper bound of 'A' and 'B' fell back to Object"
        );
        assert_eq!(
            DiagnosticReason::OpaqueInstruction.to_string(),
            "opaque instruction typed as top"
        );
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = AnalysisDiagnostic::new(DiagnosticReason::MissingClass(
            "com.example.Gone".to_string(),
        ))
        .with_context("value v4");

        let display = diag.to_string();
        assert!(display.contains("missing class 'com.example.Gone'"));
        assert!(display.contains("value v4"));
    }
}
