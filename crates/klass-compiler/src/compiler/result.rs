//! The outcome of a compilation.

use std::sync::Arc;

use klass_core::model::DomainModel;

use crate::error::{CompileError, Diagnostic};

/// A domain model, present only when no error was reported, together with
/// every diagnostic of the run.
#[derive(Debug)]
pub struct CompilationResult {
    model: Option<DomainModel>,
    diagnostics: Vec<Diagnostic>,
    sources: Vec<(Arc<str>, Arc<str>)>,
}

impl CompilationResult {
    pub(crate) fn new(
        model: Option<DomainModel>,
        diagnostics: Vec<Diagnostic>,
        sources: Vec<(Arc<str>, Arc<str>)>,
    ) -> Self {
        Self {
            model,
            diagnostics,
            sources,
        }
    }

    pub fn model(&self) -> Option<&DomainModel> {
        self.model.as_ref()
    }

    /// Diagnostics in the order they were first reported.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics ordered by severity (errors first), then by unit, line
    /// and column. Diagnostics without a location come last in their
    /// severity.
    pub fn sorted_diagnostics(&self) -> Vec<&Diagnostic> {
        let mut sorted: Vec<&Diagnostic> = self.diagnostics.iter().collect();
        sorted.sort_by_key(|diagnostic| {
            let position = diagnostic.location().map_or((usize::MAX, 0, 0), |location| {
                (location.unit(), location.line(), location.column())
            });
            (diagnostic.severity(), position)
        });
        sorted
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity().is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity().is_warning())
    }

    /// Name and text of a compilation unit, for rendering diagnostics.
    pub fn source(&self, unit: usize) -> Option<(&str, &str)> {
        self.sources
            .get(unit)
            .map(|(name, text)| (name.as_ref(), text.as_ref()))
    }

    /// The model, or every diagnostic if the compilation failed.
    pub fn into_result(self) -> Result<DomainModel, CompileError> {
        match self.model {
            Some(model) => Ok(model),
            None => Err(CompileError::new(self.diagnostics)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Location;

    fn located(diagnostic: Diagnostic, unit: usize, line: usize) -> Diagnostic {
        diagnostic.with_location(Location::new(unit, Arc::from("qa.klass"), line, 1))
    }

    #[test]
    fn test_sorted_diagnostics() {
        let result = CompilationResult::new(
            None,
            vec![
                located(Diagnostic::warning("w"), 0, 1),
                located(Diagnostic::error("late"), 1, 2),
                Diagnostic::error("unplaced"),
                located(Diagnostic::error("early"), 0, 9),
            ],
            Vec::new(),
        );

        let messages: Vec<&str> = result
            .sorted_diagnostics()
            .into_iter()
            .map(Diagnostic::message)
            .collect();
        assert_eq!(messages, ["early", "late", "unplaced", "w"]);
        assert_eq!(result.diagnostics()[0].message(), "w");
    }

    #[test]
    fn test_into_result_without_model() {
        let result = CompilationResult::new(None, vec![Diagnostic::error("boom")], Vec::new());
        assert!(result.has_errors());

        let err = result.into_result().unwrap_err();
        assert_eq!(err.error_count(), 1);
    }

    #[test]
    fn test_source_lookup() {
        let result = CompilationResult::new(
            None,
            Vec::new(),
            vec![(Arc::from("qa.klass"), Arc::from("package qa"))],
        );
        assert_eq!(result.source(0), Some(("qa.klass", "package qa")));
        assert_eq!(result.source(1), None);
    }
}
