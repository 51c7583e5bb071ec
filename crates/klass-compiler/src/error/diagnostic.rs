//! The core diagnostic type for the Klass error system.
//!
//! A [`Diagnostic`] represents a single error or warning with an optional
//! annotation code, multiple labeled source spans, help text, and the
//! resolved location of its primary label.

use std::{fmt, path::Path, sync::Arc};

use crate::{
    error::{Severity, annotation_code::AnnotationCode, label::Label},
    span::Span,
};

/// Where a diagnostic points: the compilation unit and the 1-based line and
/// column of its primary label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    unit: usize,
    source_name: Arc<str>,
    line: usize,
    column: usize,
}

impl Location {
    pub fn new(unit: usize, source_name: Arc<str>, line: usize, column: usize) -> Self {
        Self {
            unit,
            source_name,
            line,
            column,
        }
    }

    /// Ordinal of the compilation unit the spans refer to.
    pub fn unit(&self) -> usize {
        self.unit
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// The source name without any leading directories.
    pub fn file_name(&self) -> &str {
        Path::new(self.source_name.as_ref())
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.source_name)
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source_name, self.line, self.column)
    }
}

/// A rich diagnostic message with source location information.
///
/// Diagnostics provide detailed information about errors and warnings,
/// including:
/// - A severity level
/// - An optional annotation code for documentation and searchability
/// - A primary message describing the issue
/// - One or more labeled source spans
/// - Optional help text with suggestions
/// - The resolved location, once the diagnostic has been attached to a unit
///
/// # Example
///
/// ```text
/// error[ERR_PRP_TYP]: cannot find type `Strin`
///   --> qa.klass:4:12
///    |
///  4 |     title: Strin;
///    |            ^^^^^ not a primitive type or enumeration
///    |
///    = help: did you mean `String`?
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<AnnotationCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
    location: Option<Location>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use klass_compiler::error::{AnnotationCode, Diagnostic};
    /// # use klass_compiler::Span;
    ///
    /// let span = Span::new(0..10);
    /// let diag = Diagnostic::error("cannot find type `Foo`")
    ///     .with_code(AnnotationCode::ErrPrpTyp)
    ///     .with_label(span, "not found")
    ///     .with_help("declare an enumeration named `Foo`");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create a diagnostic whose severity follows the code's prefix.
    pub fn annotation(code: AnnotationCode, message: impl Into<String>) -> Self {
        Self::new(code.severity(), message).with_code(code)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the annotation code, if any.
    pub fn code(&self) -> Option<AnnotationCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Span of the first primary label.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Get the resolved location, if the diagnostic was attached to a unit.
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Set the annotation code.
    pub fn with_code(mut self, code: AnnotationCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Set the resolved location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Promote a warning to an error, keeping everything else.
    pub fn into_error(mut self) -> Self {
        self.severity = Severity::Error;
        self
    }

    /// Move every label onto `span`, keeping the message.
    ///
    /// Used for diagnostics raised inside synthesized source text, which
    /// the user never sees.
    pub(crate) fn relocate(mut self, span: Span, note: impl Into<String>) -> Self {
        self.labels = vec![Label::primary(span, note)];
        self
    }

    /// Identity used to drop repeated reports of the same problem.
    ///
    /// Diagnostics without a location never compare equal by key.
    pub(crate) fn dedup_key(&self) -> Option<(String, usize, usize, Option<AnnotationCode>)> {
        self.location.as_ref().map(|location| {
            (
                location.file_name().to_string(),
                location.line(),
                location.column(),
                self.code,
            )
        })
    }

    /// Create a new diagnostic with the given severity and message.
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
            location: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[ERR_DUP_TOP]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::new(Severity::Error, "test error");

        assert!(diag.severity().is_error());
        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.labels().is_empty());
        assert!(diag.help().is_none());
        assert!(diag.location().is_none());
    }

    #[test]
    fn test_annotation_follows_code_severity() {
        let warning = Diagnostic::annotation(AnnotationCode::WrnPrvUnr, "unused");
        let error = Diagnostic::annotation(AnnotationCode::ErrDupTop, "duplicate");

        assert!(warning.severity().is_warning());
        assert!(error.severity().is_error());
        assert_eq!(error.code(), Some(AnnotationCode::ErrDupTop));
        assert!(warning.into_error().severity().is_error());
    }

    #[test]
    fn test_diagnostic_with_labels() {
        let diag = Diagnostic::error("duplicate definition")
            .with_secondary_label(Span::new(5..15), "first declared here")
            .with_label(Span::new(10..20), "duplicate here");

        assert_eq!(diag.labels().len(), 2);
        assert!(diag.labels()[0].is_secondary());
        assert_eq!(diag.primary_span(), Some(Span::new(10..20)));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error("cannot find type `Foo`").with_code(AnnotationCode::ErrPrpTyp);
        assert_eq!(
            diag.to_string(),
            "error[ERR_PRP_TYP]: cannot find type `Foo`"
        );

        let diag = Diagnostic::warning("unused import");
        assert_eq!(diag.to_string(), "warning: unused import");
    }

    #[test]
    fn test_dedup_key_ignores_directories() {
        let located = |name: &str| {
            Diagnostic::error("x")
                .with_code(AnnotationCode::ErrDupTop)
                .with_location(Location::new(0, Arc::from(name), 3, 7))
        };

        assert_eq!(
            located("a/b/qa.klass").dedup_key(),
            located("c/qa.klass").dedup_key()
        );
        assert_ne!(located("qa.klass").dedup_key(), located("qb.klass").dedup_key());
        assert!(Diagnostic::error("x").dedup_key().is_none());
    }

    #[test]
    fn test_relocate_replaces_labels() {
        let diag = Diagnostic::error("unknown member")
            .with_label(Span::new(40..45), "not found")
            .with_secondary_label(Span::new(10..12), "on this class")
            .relocate(Span::new(3..12), "in code generated from here");

        assert_eq!(diag.labels().len(), 1);
        assert_eq!(diag.primary_span(), Some(Span::new(3..12)));
        assert_eq!(diag.labels()[0].message(), "in code generated from here");
    }

    #[test]
    fn test_location_display() {
        let location = Location::new(2, Arc::from("models/qa.klass"), 12, 5);
        assert_eq!(location.to_string(), "models/qa.klass:12:5");
        assert_eq!(location.file_name(), "qa.klass");
        assert_eq!(location.unit(), 2);
    }
}
