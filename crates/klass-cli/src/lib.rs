//! CLI logic for the Klass model compiler.
//!
//! This module contains the core CLI logic for the Klass model compiler.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::info;

use klass::{Compiled, Compiler, KlassError};

/// Run the Klass CLI application
///
/// This function compiles the input files as one model and writes an
/// outline of the resulting domain model to the output file, or logs it
/// when no output file is given.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `KlassError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Compilation errors
pub fn run(args: &Args) -> Result<Compiled, KlassError> {
    info!(
        inputs = args.inputs.len(),
        output_path:? = args.output;
        "Compiling model"
    );

    // Load configuration
    let app_config = config::load_config(args.config.as_ref())?;

    let compiler = Compiler::new(app_config);
    let compiled = compiler.compile_files(&args.inputs)?;

    let outline = compiled.model().to_string();
    match &args.output {
        Some(output) => {
            fs::write(output, outline)?;
            info!(output_file = output; "Model outline written");
        }
        None => info!("Model outline\n{outline}"),
    }

    Ok(compiled)
}
