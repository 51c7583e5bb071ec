//! Diagnostics for the Klass compiler.
//!
//! This module provides the error handling system shared by the lexer, the
//! parser and every compiler phase:
//! - Annotation codes (`ERR_*`, `WRN_*`) for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels
//! - A deduplicating collector for accumulating many diagnostics
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning with an optional annotation code, multiple
//! source locations, and help text. Lexer and parser diagnostics are wrapped
//! in [`ParseError`]; a failed compilation returns a [`CompileError`].
//!
//! # Example
//!
//! ```
//! # use klass_compiler::error::{AnnotationCode, Diagnostic};
//! # use klass_compiler::Span;
//!
//! let span = Span::new(100..108);
//! let original_span = Span::new(20..28);
//!
//! let diag = Diagnostic::error("duplicate top level item name `Question`")
//!     .with_code(AnnotationCode::ErrDupTop)
//!     .with_label(span, "duplicate declaration")
//!     .with_secondary_label(original_span, "first declared here")
//!     .with_help("rename one of the declarations");
//! ```

mod annotation_code;
mod collector;
mod compile_error;
mod diagnostic;
mod label;
mod parse_error;
mod severity;

pub use annotation_code::AnnotationCode;
pub use collector::DiagnosticCollector;
pub use compile_error::CompileError;
pub use diagnostic::{Diagnostic, Location};
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
