//! Compilation units and diagnostic positioning.

use std::{rc::Rc, sync::Arc};

use log::trace;

use crate::{
    error::{Diagnostic, DiagnosticCollector, Location},
    source::{CompilationUnit, MacroOrigin, UnitTree},
};

/// Owns the compilation units of a run and the diagnostics raised against
/// them.
///
/// Diagnostics are positioned against the current unit. A diagnostic raised
/// while a macro unit is current is moved to the user-visible place that
/// caused the macro to expand.
#[derive(Debug, Default)]
pub(crate) struct Annotator {
    units: Vec<Rc<CompilationUnit>>,
    current: Option<usize>,
    collector: DiagnosticCollector,
}

impl Annotator {
    pub fn add_unit(
        &mut self,
        source_name: Arc<str>,
        text: Arc<str>,
        tree: UnitTree,
        macro_origin: Option<MacroOrigin>,
    ) -> usize {
        let ordinal = self.units.len();
        self.units.push(Rc::new(CompilationUnit::new(
            ordinal,
            source_name,
            text,
            tree,
            macro_origin,
        )));
        ordinal
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn unit(&self, ordinal: usize) -> Rc<CompilationUnit> {
        Rc::clone(&self.units[ordinal])
    }

    pub fn units(&self) -> &[Rc<CompilationUnit>] {
        &self.units
    }

    pub fn current_unit(&self) -> Option<usize> {
        self.current
    }

    /// Makes `unit` current, returning the previous current unit.
    pub(super) fn enter(&mut self, unit: usize) -> Option<usize> {
        self.current.replace(unit)
    }

    pub(super) fn restore(&mut self, previous: Option<usize>) {
        self.current = previous;
    }

    pub fn is_macro_unit(&self, unit: usize) -> bool {
        self.units[unit].macro_origin().is_some()
    }

    /// Records a diagnostic against the current unit.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        let diagnostic = match self.current {
            Some(unit) => self.locate(unit, diagnostic),
            None => diagnostic,
        };
        trace!(diagnostic:% = diagnostic; "Diagnostic emitted");
        self.collector.emit(diagnostic);
    }

    fn locate(&self, unit: usize, diagnostic: Diagnostic) -> Diagnostic {
        let (unit, diagnostic) = match self.units[unit].macro_origin() {
            Some(origin) => (
                origin.unit,
                diagnostic.relocate(origin.span, "in code generated from here"),
            ),
            None => (unit, diagnostic),
        };
        let unit = &self.units[unit];
        let offset = diagnostic.primary_span().map_or(0, |span| span.start());
        let (line, column) = unit.line_column(offset);
        diagnostic.with_location(Location::new(
            unit.ordinal(),
            Arc::clone(unit.source_name()),
            line,
            column,
        ))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.collector.diagnostics()
    }

    pub fn into_parts(self) -> (Vec<Rc<CompilationUnit>>, DiagnosticCollector) {
        (self.units, self.collector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AnnotationCode, span::Span};

    fn annotator() -> Annotator {
        let mut annotator = Annotator::default();
        annotator.add_unit(
            Arc::from("models/qa.klass"),
            Arc::from("package qa\n\nclass Question versioned\n"),
            UnitTree::Invalid,
            None,
        );
        annotator
    }

    #[test]
    fn test_emit_locates_against_current_unit() {
        let mut annotator = annotator();
        annotator.enter(0);
        annotator.emit(
            Diagnostic::annotation(AnnotationCode::ErrClsKey, "no key")
                .with_label(Span::new(18..26), "here"),
        );

        let (_, collector) = annotator.into_parts();
        let location = collector.diagnostics()[0].location().cloned();
        assert_eq!(
            location,
            Some(Location::new(0, Arc::from("models/qa.klass"), 3, 7))
        );
    }

    #[test]
    fn test_macro_unit_diagnostics_move_to_origin() {
        let mut annotator = annotator();
        let origin = MacroOrigin {
            unit: 0,
            span: Span::new(27..36),
        };
        let unit = annotator.add_unit(
            Arc::from("qa.klass (macro)"),
            Arc::from("class QuestionVersion {}"),
            UnitTree::Invalid,
            Some(origin),
        );
        assert!(annotator.is_macro_unit(unit));
        assert_eq!(annotator.unit(unit).macro_origin(), Some(origin));

        annotator.enter(unit);
        annotator.emit(
            Diagnostic::annotation(AnnotationCode::ErrClsKey, "no key")
                .with_label(Span::new(6..21), "here"),
        );

        let (_, collector) = annotator.into_parts();
        let diagnostic = &collector.diagnostics()[0];
        assert_eq!(diagnostic.primary_span(), Some(Span::new(27..36)));
        let location = diagnostic.location().map(|l| (l.unit(), l.line(), l.column()));
        assert_eq!(location, Some((0, 3, 16)));
    }
}
