use thiserror::Error;

use crate::error::Diagnostic;

/// A compilation that produced at least one error-severity diagnostic.
///
/// Carries every diagnostic of the run, warnings included, in emission order.
#[derive(Debug, Error)]
#[error("compilation failed with {errors} error(s) and {warnings} warning(s)")]
pub struct CompileError {
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

impl CompileError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        let errors = diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity().is_error())
            .count();
        let warnings = diagnostics.len() - errors;
        Self {
            diagnostics,
            errors,
            warnings,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_counts() {
        let err = CompileError::new(vec![
            Diagnostic::error("a"),
            Diagnostic::warning("b"),
            Diagnostic::error("c"),
        ]);

        assert_eq!(err.error_count(), 2);
        assert_eq!(
            err.to_string(),
            "compilation failed with 2 error(s) and 1 warning(s)"
        );
    }
}
