//! Macro expansion: inference phases synthesize source text, which is
//! parsed into a new compilation unit.
//!
//! Root macros produce whole files that declare new top-level elements.
//! In-place macros produce members or service criteria that are spliced
//! into an existing element. Either way the new unit remembers the
//! user-visible place that caused it, so diagnostics about generated code
//! point at that place.

use std::sync::Arc;

use log::debug;

use crate::{
    compiler::{
        staging::{ClassifierHandle, ServiceHandle},
        state::CompilerState,
    },
    lexer, parser,
    source::{MacroOrigin, UnitTree},
    span::Span,
    tokens::PositionedToken,
};

/// Adds a unit of members to be spliced into `host`.
pub(crate) fn expand_members(
    state: &mut CompilerState,
    host: ClassifierHandle,
    text: String,
    span: Span,
) -> usize {
    let members = parse_generated(&text, parser::build_members);
    add_macro_unit(state, text, UnitTree::Members { host, members }, span)
}

/// Adds a unit of service criteria to be spliced into `host`.
pub(crate) fn expand_service_criteria(
    state: &mut CompilerState,
    host: ServiceHandle,
    text: String,
    span: Span,
) -> usize {
    let criteria = parse_generated(&text, parser::build_service_criteria);
    add_macro_unit(state, text, UnitTree::ServiceCriteria { host, criteria }, span)
}

/// Adds a unit holding a whole generated file.
pub(crate) fn expand_file(state: &mut CompilerState, text: String, span: Span) -> usize {
    let file = parse_generated(&text, parser::build_source_file);
    add_macro_unit(state, text, UnitTree::File(file), span)
}

/// # Panics
///
/// Panics if the generated text does not lex or parse.
fn parse_generated<T, E: std::fmt::Display>(
    text: &str,
    parse: impl FnOnce(&[PositionedToken<'_>]) -> Result<T, E>,
) -> T {
    let tokens = match lexer::tokenize(text) {
        Ok(tokens) => tokens,
        Err(err) => panic!("illegal state: generated code does not lex: {err}\n{text}"),
    };
    match parse(&tokens) {
        Ok(tree) => tree,
        Err(err) => panic!("illegal state: generated code does not parse: {err}\n{text}"),
    }
}

fn add_macro_unit(state: &mut CompilerState, text: String, tree: UnitTree, span: Span) -> usize {
    let current = state.current_unit();
    // A macro expanded while walking generated code traces back to the
    // same user-visible place as that code.
    let origin = state
        .annotator
        .unit(current)
        .macro_origin()
        .unwrap_or(MacroOrigin { unit: current, span });
    let origin_name = Arc::clone(state.annotator.unit(origin.unit).source_name());
    let source_name: Arc<str> = Arc::from(format!("{origin_name} (macro)"));

    let unit = state
        .annotator
        .add_unit(source_name, Arc::from(text), tree, Some(origin));
    debug!(unit, origin = origin.unit; "Macro expanded");
    unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compiler::CompileOptions, source::SourceUnit};

    #[test]
    fn test_macro_unit_points_at_user_origin() {
        let mut state = CompilerState::new(CompileOptions::default());
        state.add_source(SourceUnit::new("qa.klass", "package qa"));

        let first = state.with_compilation_unit(0, |state| {
            expand_file(state, "package qa\nclass A { }".to_string(), Span::new(0..7))
        });
        let second = state.with_compilation_unit(first, |state| {
            expand_file(state, "package qa\nclass B { }".to_string(), Span::new(3..4))
        });

        let origin = state.annotator.unit(second).macro_origin();
        assert_eq!(
            origin,
            Some(MacroOrigin {
                unit: 0,
                span: Span::new(0..7)
            })
        );
        assert_eq!(
            state.annotator.unit(second).source_name().as_ref(),
            "qa.klass (macro)"
        );
    }

    #[test]
    #[should_panic(expected = "does not parse")]
    fn test_unparsable_generated_code_panics() {
        let mut state = CompilerState::new(CompileOptions::default());
        state.add_source(SourceUnit::new("qa.klass", "package qa"));
        state.with_compilation_unit(0, |state| {
            expand_file(state, "class {".to_string(), Span::default())
        });
    }
}
