//! Collector for accumulating diagnostics.
//!
//! The [`DiagnosticCollector`] lets the lexer, the parser and every compiler
//! phase report multiple errors and warnings instead of failing on the first
//! one.

use std::collections::HashSet;

use crate::error::{AnnotationCode, Diagnostic, ParseError};

/// An append-only, deduplicating list of diagnostics.
///
/// Diagnostics are kept in first-occurrence order. A located diagnostic is
/// dropped when one with the same file name, line, column and code has
/// already been emitted.
///
/// # Example
///
/// ```
/// # use klass_compiler::error::{AnnotationCode, Diagnostic, DiagnosticCollector};
/// # use klass_compiler::Span;
///
/// let mut collector = DiagnosticCollector::new();
///
/// collector.emit(
///     Diagnostic::error("cannot find type `Foo`")
///         .with_code(AnnotationCode::ErrPrpTyp)
///         .with_label(Span::new(0..3), "not found"),
/// );
///
/// assert!(collector.has_errors());
/// assert!(collector.finish().is_err());
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    seen: HashSet<(String, usize, usize, Option<AnnotationCode>)>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    ///
    /// Returns `false` if the diagnostic repeats one already collected.
    pub fn emit(&mut self, diagnostic: Diagnostic) -> bool {
        if let Some(key) = diagnostic.dedup_key()
            && !self.seen.insert(key)
        {
            return false;
        }
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
        true
    }

    /// Emit every diagnostic in order.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.emit(diagnostic);
        }
    }

    /// Whether any error-severity diagnostic was emitted.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the collector, returning every diagnostic in emission order.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Finish collection and return a result.
    ///
    /// - If there are errors, returns `Err(ParseError)` with all diagnostics.
    /// - If there are no errors, returns `Ok(())`.
    ///
    /// Warnings are discarded in the success case.
    pub fn finish(self) -> Result<(), ParseError> {
        if self.has_errors {
            Err(ParseError::new(self.diagnostics))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{error::Location, span::Span};

    fn located(code: AnnotationCode, line: usize, column: usize) -> Diagnostic {
        Diagnostic::annotation(code, "message")
            .with_label(Span::new(0..1), "here")
            .with_location(Location::new(0, Arc::from("dir/qa.klass"), line, column))
    }

    #[test]
    fn test_collector_new_finish_ok() {
        let collector = DiagnosticCollector::new();
        assert!(collector.is_empty());
        assert!(collector.finish().is_ok());
    }

    #[test]
    fn test_collector_emit_error_finish_err() {
        let mut collector = DiagnosticCollector::new();

        collector.emit(Diagnostic::error("test error"));

        assert!(collector.has_errors());
        assert!(collector.finish().is_err());
    }

    #[test]
    fn test_collector_emit_warning_finish_ok() {
        let mut collector = DiagnosticCollector::new();

        collector.emit(Diagnostic::warning("test warning"));

        assert!(!collector.has_errors());
        assert!(collector.finish().is_ok());
    }

    #[test]
    fn test_collector_drops_duplicates() {
        let mut collector = DiagnosticCollector::new();

        assert!(collector.emit(located(AnnotationCode::ErrDupTop, 3, 7)));
        assert!(!collector.emit(located(AnnotationCode::ErrDupTop, 3, 7)));
        assert!(collector.emit(located(AnnotationCode::ErrTopNme, 3, 7)));
        assert!(collector.emit(located(AnnotationCode::ErrDupTop, 4, 7)));

        assert_eq!(collector.len(), 3);
    }

    #[test]
    fn test_collector_keeps_unlocated_duplicates() {
        let mut collector = DiagnosticCollector::new();

        collector.emit(Diagnostic::error("same"));
        collector.emit(Diagnostic::error("same"));

        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn test_collector_finish_with_errors() {
        let mut collector = DiagnosticCollector::new();

        collector.extend([
            Diagnostic::error("test error").with_code(AnnotationCode::ErrPrpTyp),
            Diagnostic::warning("test warning"),
        ]);

        let err = collector.finish().unwrap_err();
        assert_eq!(err.diagnostics().len(), 2);
        assert_eq!(err.diagnostics()[0].message(), "test error");
    }
}
