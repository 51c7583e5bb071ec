//! Process-scoped state of one compilation run.

use std::{
    collections::HashSet,
    panic::{self, AssertUnwindSafe},
};

use klass_core::identifier::Id;
use log::{debug, trace};

use crate::{
    compiler::{
        CompileOptions,
        annotator::Annotator,
        phases::PhaseKind,
        staging::{PropertyHandle, Staging},
        symbols::{SymbolTable, TopLevelHandle},
    },
    error::{AnnotationCode, Diagnostic},
    lexer, parser,
    source::{SourceUnit, UnitTree},
    span::Spanned,
};

/// Everything a phase reads and writes.
///
/// Created once per compilation and discarded with it.
#[derive(Debug)]
pub(crate) struct CompilerState {
    pub annotator: Annotator,
    pub symbols: SymbolTable,
    pub staging: Staging,
    /// Package of each unit, recorded by the compilation unit phase.
    pub packages: Vec<Option<Spanned<Id>>>,
    /// Top-level elements in declaration order.
    pub top_level: Vec<TopLevelHandle>,
    /// Properties named by at least one member path.
    pub referenced: HashSet<PropertyHandle>,
    pub options: CompileOptions,
    visited: HashSet<(PhaseKind, usize)>,
}

impl CompilerState {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            annotator: Annotator::default(),
            symbols: SymbolTable::default(),
            staging: Staging::default(),
            packages: Vec::new(),
            top_level: Vec::new(),
            referenced: HashSet::new(),
            options,
            visited: HashSet::new(),
        }
    }

    /// Adds a user-provided unit, lexing and parsing it unless it arrives
    /// with a syntax tree. A unit that fails to parse stays in the list so
    /// its diagnostics can be positioned, but no phase looks inside it.
    pub fn add_source(&mut self, source: SourceUnit) -> usize {
        let (name, text, syntax) = source.into_parts();
        let parsed = match syntax {
            Some(syntax) => Ok(syntax),
            None => lexer::tokenize(&text)
                .map_err(|err| err.into_diagnostics())
                .and_then(|tokens| {
                    parser::build_source_file(&tokens).map_err(|diagnostic| vec![diagnostic])
                }),
        };

        match parsed {
            Ok(file) => {
                debug!(
                    source = name.as_ref(),
                    declarations = file.declarations.len();
                    "Source parsed"
                );
                self.annotator.add_unit(name, text, UnitTree::File(file), None)
            }
            Err(diagnostics) => {
                debug!(
                    source = name.as_ref(),
                    errors = diagnostics.len();
                    "Source failed to parse"
                );
                let unit = self.annotator.add_unit(name, text, UnitTree::Invalid, None);
                self.with_compilation_unit(unit, |state| {
                    for diagnostic in diagnostics {
                        state.emit(diagnostic);
                    }
                });
                unit
            }
        }
    }

    /// Runs `body` with `unit` as the current unit, restoring the previous
    /// current unit afterwards, also when `body` panics.
    pub fn with_compilation_unit<R>(
        &mut self,
        unit: usize,
        body: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let previous = self.annotator.enter(unit);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&mut *self)));
        self.annotator.restore(previous);
        match outcome {
            Ok(value) => value,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    pub fn current_unit(&self) -> usize {
        match self.annotator.current_unit() {
            Some(unit) => unit,
            None => panic!("illegal state: no current compilation unit"),
        }
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.annotator.emit(diagnostic);
    }

    /// Runs one phase over one unit.
    ///
    /// # Panics
    ///
    /// Panics if the phase already walked this unit.
    pub fn run_phase(&mut self, phase: PhaseKind, unit: usize) {
        assert!(
            self.visited.insert((phase, unit)),
            "illegal state: phase {} ran twice on unit {unit}",
            phase.name()
        );
        trace!(phase = phase.name(), unit; "Walking unit");
        self.with_compilation_unit(unit, |state| phase.run(state, unit));
    }

    /// The package of a unit, empty if none was recorded.
    pub fn package_of(&self, unit: usize) -> Id {
        self.packages
            .get(unit)
            .and_then(|package| package.as_ref())
            .map_or_else(|| Id::new(""), |package| *package.inner())
    }

    /// Enters a top-level element in the symbol table, reporting a
    /// redeclaration once.
    pub fn declare_top_level_element(
        &mut self,
        name: &Spanned<Id>,
        unit: usize,
        handle: TopLevelHandle,
    ) {
        self.top_level.push(handle);
        let Some(previous) = self.symbols.declare(**name, name.span(), unit, handle) else {
            return;
        };
        // Service groups for the same class are reported together later.
        if matches!(handle, TopLevelHandle::ServiceGroup(_)) {
            return;
        }

        let mut diagnostic = Diagnostic::annotation(
            AnnotationCode::ErrDupTop,
            format!(
                "duplicate top level {} name `{}`",
                handle.category().name(),
                name.inner()
            ),
        )
        .with_label(name.span(), "declared again here");
        if previous.unit == unit {
            diagnostic = diagnostic
                .with_secondary_label(previous.span, "first declared here")
                .with_help("the later declaration replaces the earlier one");
        } else {
            let other = self.annotator.unit(previous.unit);
            diagnostic = diagnostic.with_help(format!(
                "also declared in `{}`; references to this name are ambiguous",
                other.source_name()
            ));
        }
        self.emit(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_compilation_unit_restores_after_panic() {
        let mut state = CompilerState::new(CompileOptions::default());
        state.add_source(SourceUnit::new("a.klass", "package a"));
        state.add_source(SourceUnit::new("b.klass", "package b"));

        state.with_compilation_unit(0, |state| {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                state.with_compilation_unit(1, |_| panic!("boom"));
            }));
            assert!(result.is_err());
            assert_eq!(state.current_unit(), 0);
        });
        assert_eq!(state.annotator.current_unit(), None);
    }

    #[test]
    fn test_unparsable_source_is_kept() {
        let mut state = CompilerState::new(CompileOptions::default());
        let unit = state.add_source(SourceUnit::new("bad.klass", "package a\nclass {"));

        assert!(matches!(state.annotator.unit(unit).tree(), UnitTree::Invalid));
        let diagnostics = state.annotator.diagnostics();
        assert!(diagnostics.iter().any(|d| d.severity().is_error()));
    }

    #[test]
    #[should_panic(expected = "ran twice")]
    fn test_phase_runs_once_per_unit() {
        let mut state = CompilerState::new(CompileOptions::default());
        state.add_source(SourceUnit::new("a.klass", "package a"));
        state.run_phase(PhaseKind::CompilationUnit, 0);
        state.run_phase(PhaseKind::CompilationUnit, 0);
    }
}
