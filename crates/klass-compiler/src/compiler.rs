//! The multi-phase semantic compiler.
//!
//! ```text
//! SourceUnit ──lex/parse──▶ CompilationUnit
//!                               │
//!                 ┌─────────────┘
//!                 ▼
//!   phase 1 ▶ phase 2 ▶ … ▶ phase 24      (staging elements, symbol table)
//!                               │
//!                               ▼
//!                         report errors
//!                               │
//!                     no errors ▼
//!                     build the DomainModel
//! ```
//!
//! Every phase walks every compilation unit before the next phase starts.
//! A phase that expands macros adds units while it runs; those units are
//! brought up to date with every earlier phase once the phase finishes, so
//! the phase itself never sees them.

mod annotator;
mod arena;
mod build;
mod macros;
mod phases;
mod report;
mod resolved;
mod result;
pub(crate) mod staging;
mod state;
mod symbols;

pub use phases::PhaseKind;
pub use result::CompilationResult;

use std::sync::Arc;

use log::{debug, info};

use crate::source::SourceUnit;

use state::CompilerState;

/// Switches that change what a compilation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Report private properties that no path or projection names.
    pub report_unreferenced_private_properties: bool,
    /// Treat every warning as an error, which also suppresses the model.
    pub warnings_as_errors: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            report_unreferenced_private_properties: true,
            warnings_as_errors: false,
        }
    }
}

/// Compiles `units` with the default options.
///
/// # Example
///
/// ```
/// use klass_compiler::{SourceUnit, compile};
///
/// let result = compile([SourceUnit::new(
///     "qa.klass",
///     "package qa\nclass Question { id: Long key id; }",
/// )]);
/// assert!(!result.has_errors());
/// assert_eq!(result.model().map(|model| model.classifiers().len()), Some(1));
/// ```
pub fn compile(units: impl IntoIterator<Item = SourceUnit>) -> CompilationResult {
    compile_with(units, CompileOptions::default())
}

/// Compiles `units`.
///
/// The result carries a domain model only if no error-severity diagnostic
/// was reported, lexer and parser errors included.
pub fn compile_with(
    units: impl IntoIterator<Item = SourceUnit>,
    options: CompileOptions,
) -> CompilationResult {
    let mut state = CompilerState::new(options);
    for unit in units {
        state.add_source(unit);
    }
    let sources = state.annotator.unit_count();
    info!(units = sources; "Compiling");

    run_pipeline(&mut state);
    report::report(&mut state);

    let blocked = state.annotator.diagnostics().iter().any(|diagnostic| {
        diagnostic.severity().is_error()
            || (options.warnings_as_errors && diagnostic.severity().is_warning())
    });
    let model = if blocked {
        None
    } else {
        Some(build::build(&mut state))
    };

    let macro_units = state.annotator.unit_count() - sources;
    let (units, collector) = state.annotator.into_parts();
    let diagnostics: Vec<_> = collector
        .into_diagnostics()
        .into_iter()
        .map(|diagnostic| {
            if options.warnings_as_errors {
                diagnostic.into_error()
            } else {
                diagnostic
            }
        })
        .collect();
    let sources = units
        .iter()
        .map(|unit| (Arc::clone(unit.source_name()), Arc::clone(unit.text())))
        .collect();

    info!(
        diagnostics = diagnostics.len(),
        macro_units,
        built = model.is_some();
        "Compilation finished"
    );
    CompilationResult::new(model, diagnostics, sources)
}

/// Runs every phase over every unit, catching up units that macro
/// expansion adds along the way.
fn run_pipeline(state: &mut CompilerState) {
    for (position, phase) in PhaseKind::ALL.into_iter().enumerate() {
        let snapshot = state.annotator.unit_count();
        debug!(phase = phase.name(), units = snapshot; "Running compiler phase");
        for unit in 0..snapshot {
            state.run_phase(phase, unit);
        }
        catch_up(state, snapshot, &PhaseKind::ALL[..position]);
    }
}

/// Runs `earlier` phases on every unit from `first` on, including units
/// added while catching up.
fn catch_up(state: &mut CompilerState, first: usize, earlier: &[PhaseKind]) {
    let mut unit = first;
    while unit < state.annotator.unit_count() {
        debug!(unit, phases = earlier.len(); "Catching up macro unit");
        for phase in earlier {
            state.run_phase(*phase, unit);
        }
        unit += 1;
    }
}

#[cfg(test)]
mod tests {
    use klass_core::identifier::Id;

    use super::*;
    use crate::error::AnnotationCode;

    fn codes(result: &CompilationResult) -> Vec<AnnotationCode> {
        result
            .diagnostics()
            .iter()
            .filter_map(|diagnostic| diagnostic.code())
            .collect()
    }

    #[test]
    fn test_default_options() {
        let options = CompileOptions::default();
        assert!(options.report_unreferenced_private_properties);
        assert!(!options.warnings_as_errors);
    }

    #[test]
    fn test_empty_input_builds_empty_model() {
        let result = compile(Vec::new());
        assert!(result.diagnostics().is_empty());
        assert_eq!(result.model().map(|model| model.classifiers().len()), Some(0));
    }

    #[test]
    fn test_parse_error_suppresses_model() {
        let result = compile([SourceUnit::new("bad.klass", "package qa\nclass {")]);
        assert!(result.has_errors());
        assert!(result.model().is_none());
    }

    #[test]
    fn test_versioned_class_is_caught_up() {
        let source = "package qa\n\
            user User { userId: String key userId maxLength(128); }\n\
            class Question versioned audited { id: Long key id; }";
        let result = compile([SourceUnit::new("qa.klass", source)]);
        assert!(!result.has_errors(), "{:?}", result.diagnostics());

        let model = result.model().unwrap();
        let version = model.find_classifier("QuestionVersion").unwrap();
        // The generated class is itself system temporal and audited.
        assert!(version.property(Id::new("systemFrom")).is_some());
        assert!(version.property(Id::new("createdOn")).is_some());
    }

    #[test]
    fn test_warnings_as_errors() {
        let source = "package qa\nclass Question { id: Long key id; secret: String private; }";
        let lenient = compile([SourceUnit::new("qa.klass", source)]);
        assert_eq!(codes(&lenient), [AnnotationCode::WrnPrvUnr]);
        assert!(lenient.model().is_some());

        let strict = compile_with(
            [SourceUnit::new("qa.klass", source)],
            CompileOptions {
                warnings_as_errors: true,
                ..CompileOptions::default()
            },
        );
        assert!(strict.has_errors());
        assert!(strict.model().is_none());

        let quiet = compile_with(
            [SourceUnit::new("qa.klass", source)],
            CompileOptions {
                report_unreferenced_private_properties: false,
                ..CompileOptions::default()
            },
        );
        assert!(quiet.diagnostics().is_empty());
    }

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        // =====================================================================
        // Strategies
        // =====================================================================

        fn property() -> impl Strategy<Value = String> {
            (
                prop::sample::select(vec!["id", "name", "status", "owner"]),
                prop::sample::select(vec!["Long", "String", "Status", "Strin", "Question"]),
                prop::sample::select(vec!["", " key id", " private", " maxLength(64)", " final"]),
            )
                .prop_map(|(name, type_name, modifier)| format!("{name}: {type_name}{modifier};"))
        }

        fn class() -> impl Strategy<Value = String> {
            (
                prop::sample::select(vec!["Question", "Answer", "Question"]),
                prop::sample::select(vec!["", " audited", " versioned", " extends Answer"]),
                prop::collection::vec(property(), 0..4),
            )
                .prop_map(|(name, modifier, properties)| {
                    format!("class {name}{modifier} {{ {} }}", properties.join(" "))
                })
        }

        fn model() -> impl Strategy<Value = String> {
            prop::collection::vec(class(), 0..4).prop_map(|classes| {
                format!(
                    "package qa\nenumeration Status {{ OPEN, }}\n{}",
                    classes.join("\n")
                )
            })
        }

        // =====================================================================
        // Property Test Functions
        // =====================================================================

        fn check_compilation_is_deterministic(source: &str) -> Result<(), TestCaseError> {
            let first = compile([SourceUnit::new("qa.klass", source)]);
            let second = compile([SourceUnit::new("qa.klass", source)]);
            prop_assert_eq!(first.diagnostics(), second.diagnostics());
            prop_assert_eq!(first.model(), second.model());
            prop_assert_eq!(first.model().is_some(), !first.has_errors());
            Ok(())
        }

        // =====================================================================
        // Proptest Wrappers
        // =====================================================================

        proptest! {
            #[test]
            fn compilation_is_deterministic(source in model()) {
                check_compilation_is_deterministic(&source)?;
            }
        }
    }
}
