//! The ParseError type for wrapping lexer and parser diagnostics.
//!
//! [`ParseError`] wraps one or more [`Diagnostic`]s produced while turning
//! source text into a syntax tree.

use std::fmt;

use crate::error::Diagnostic;

/// Error type for lexing and parsing.
///
/// Wraps one or more diagnostics.
#[derive(Debug)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    /// Create a new parse error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{}", first)?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnnotationCode;

    #[test]
    fn test_parse_error_from_diagnostic() {
        let diag = Diagnostic::error("unexpected token").with_code(AnnotationCode::ErrSynTok);
        let err: ParseError = diag.into();

        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.diagnostics()[0].message(), "unexpected token");
    }

    #[test]
    fn test_parse_error_display_counts_the_rest() {
        let err: ParseError = vec![
            Diagnostic::error("first").with_code(AnnotationCode::ErrLexChr),
            Diagnostic::error("second"),
            Diagnostic::error("third"),
        ]
        .into();

        assert_eq!(err.to_string(), "error[ERR_LEX_CHR]: first (+2 more)");
    }

    #[test]
    fn test_parse_error_display_single() {
        let err = ParseError::new(vec![Diagnostic::error("only")]);
        assert_eq!(err.to_string(), "error: only");
        assert_eq!(err.into_diagnostics().len(), 1);
    }
}
