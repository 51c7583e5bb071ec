//! Error types for Klass operations.
//!
//! This module provides the main error type [`KlassError`] which wraps
//! the error conditions that can occur while loading and compiling models.

use std::io;

use thiserror::Error;

use klass_compiler::CompileError;

use crate::Sources;

/// The main error type for Klass operations.
///
/// # Diagnostic Variants
///
/// The `Compile` variant carries every diagnostic of the failed run together
/// with the text of each compilation unit, so the spans of the diagnostics
/// can be rendered against their source.
#[derive(Debug, Error)]
pub enum KlassError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Compile { err: CompileError, sources: Sources },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl KlassError {
    /// Create a new `Compile` error with the sources it refers to.
    pub fn new_compile_error(err: CompileError, sources: Sources) -> Self {
        Self::Compile { err, sources }
    }
}
