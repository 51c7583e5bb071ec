//! # Klass Compiler
//!
//! Lexer, parser and multi-phase semantic compiler for the Klass
//! domain-modeling language. Source text goes in; a fully resolved
//! [`DomainModel`](klass_core::model::DomainModel) and a list of positioned
//! diagnostics come out.
//!
//! ## Usage
//!
//! ```
//! use klass_compiler::{CompileError, SourceUnit, compile};
//!
//! fn main() -> Result<(), CompileError> {
//!     let source = r#"
//!         package com.example.qa
//!
//!         class Question
//!         {
//!             id: Long key id;
//!             title: String maxLength(256);
//!         }
//!     "#;
//!
//!     let model = compile([SourceUnit::new("qa.klass", source)]).into_result()?;
//!     assert_eq!(model.classifiers().len(), 1);
//!     Ok(())
//! }
//! ```

mod compiler;
pub mod error;
mod lexer;
mod parser;
#[cfg(test)]
mod parser_tests;
mod source;
mod span;
pub mod syntax;
mod tokens;

pub use compiler::{CompilationResult, CompileOptions, PhaseKind, compile, compile_with};
pub use error::{CompileError, Diagnostic, ParseError, Severity};
pub use source::SourceUnit;
pub use span::{Span, Spanned};

/// Parse source text into a syntax tree without compiling it.
///
/// The tree can be handed to the compiler with [`SourceUnit::with_syntax`].
///
/// # Example
///
/// ```
/// # use klass_compiler::{ParseError, parse};
///
/// fn main() -> Result<(), ParseError> {
///     let file = parse("package qa\nenumeration Status { OPEN, CLOSED, }")?;
///     assert_eq!(file.declarations.len(), 1);
///     Ok(())
/// }
/// ```
pub fn parse(source: &str) -> Result<syntax::SourceFile, ParseError> {
    let tokens = lexer::tokenize(source)?;
    let file = parser::build_source_file(&tokens)?;
    Ok(file)
}
