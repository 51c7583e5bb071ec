//! Klass - A textual domain-modeling language.
//!
//! Compilation of Klass sources (classes, associations, enumerations,
//! projections and services) into a fully resolved domain model, with
//! positioned diagnostics for everything the compiler rejects.

pub mod config;

mod error;

pub use klass_compiler::{
    CompileError, Diagnostic, Severity, SourceUnit, Span,
    error::{AnnotationCode, Label, Location},
};
pub use klass_core::{identifier, model};

pub use error::KlassError;

use std::{fs, path::Path};

use log::{debug, info, trace};

use klass_compiler::CompilationResult;
use klass_core::model::DomainModel;

use config::AppConfig;

/// Name and text of every compilation unit of a run, macro units included.
///
/// Diagnostic spans are offsets into the text of the unit named by their
/// [`Location`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sources {
    units: Vec<(String, String)>,
}

impl Sources {
    fn from_result(result: &CompilationResult) -> Self {
        let units = (0..)
            .map_while(|unit| result.source(unit))
            .map(|(name, text)| (name.to_string(), text.to_string()))
            .collect();
        Self { units }
    }

    /// Name and text of a unit.
    pub fn get(&self, unit: usize) -> Option<(&str, &str)> {
        self.units
            .get(unit)
            .map(|(name, text)| (name.as_str(), text.as_str()))
    }

    /// The source a diagnostic's spans point into.
    pub fn of(&self, diagnostic: &Diagnostic) -> Option<(&str, &str)> {
        diagnostic
            .location()
            .and_then(|location| self.get(location.unit()))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// A successfully built domain model with the warnings of its compilation.
#[derive(Debug)]
pub struct Compiled {
    model: DomainModel,
    warnings: Vec<Diagnostic>,
    sources: Sources,
}

impl Compiled {
    pub fn model(&self) -> &DomainModel {
        &self.model
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    pub fn into_model(self) -> DomainModel {
        self.model
    }
}

/// Compiles Klass sources into a domain model.
///
/// # Examples
///
/// ```rust
/// use klass::{Compiler, config::AppConfig};
///
/// let source = "package qa\nclass Question { id: Long key id; }";
///
/// // With custom config
/// let compiler = Compiler::new(AppConfig::default());
///
/// let compiled = compiler
///     .compile_source("qa.klass", source)
///     .expect("Failed to compile");
/// assert!(compiled.model().find_classifier("Question").is_some());
///
/// // Or use default config
/// let compiler = Compiler::default();
/// ```
#[derive(Debug, Default)]
pub struct Compiler {
    config: AppConfig,
}

impl Compiler {
    /// Create a new compiler with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration including compiler and output settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Compile a single source text.
    ///
    /// # Errors
    ///
    /// Returns [`KlassError::Compile`] if any error-severity diagnostic was
    /// reported.
    pub fn compile_source(&self, name: &str, text: &str) -> Result<Compiled, KlassError> {
        self.compile([SourceUnit::new(name, text)])
    }

    /// Read and compile a set of files as one model.
    ///
    /// Each file becomes one compilation unit named by its path.
    ///
    /// # Errors
    ///
    /// Returns [`KlassError::Io`] if a file cannot be read and
    /// [`KlassError::Compile`] if the compilation reported errors.
    pub fn compile_files<P: AsRef<Path>>(
        &self,
        paths: impl IntoIterator<Item = P>,
    ) -> Result<Compiled, KlassError> {
        let mut units = Vec::new();
        for path in paths {
            let path = path.as_ref();
            debug!(path = path.display().to_string(); "Reading source file");
            let text = fs::read_to_string(path)?;
            units.push(SourceUnit::new(path.display().to_string(), text));
        }
        self.compile(units)
    }

    /// Compile a set of units as one model.
    ///
    /// # Errors
    ///
    /// Returns [`KlassError::Compile`] with every diagnostic of the run if
    /// any error-severity diagnostic was reported.
    pub fn compile(
        &self,
        units: impl IntoIterator<Item = SourceUnit>,
    ) -> Result<Compiled, KlassError> {
        let options = self.config.compiler().options();
        info!(
            warnings_as_errors = options.warnings_as_errors;
            "Compiling model"
        );

        let result = klass_compiler::compile_with(units, options);
        let sources = Sources::from_result(&result);
        let warnings: Vec<Diagnostic> = result.warnings().cloned().collect();

        let model = result
            .into_result()
            .map_err(|err| KlassError::new_compile_error(err, sources.clone()))?;

        if self.config.output().summary() {
            info!(
                enumerations = model.enumerations().len(),
                classifiers = model.classifiers().len(),
                associations = model.associations().len(),
                projections = model.projections().len(),
                service_groups = model.service_groups().len(),
                warnings = warnings.len();
                "Model built"
            );
        }
        trace!(model:?; "Built model");

        Ok(Compiled {
            model,
            warnings,
            sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_follow_units() {
        let result = klass_compiler::compile([
            SourceUnit::new("a.klass", "package a"),
            SourceUnit::new("b.klass", "package b"),
        ]);
        let sources = Sources::from_result(&result);

        assert_eq!(sources.len(), 2);
        assert_eq!(sources.get(1), Some(("b.klass", "package b")));
        assert_eq!(sources.get(2), None);
    }

    #[test]
    fn test_diagnostic_source_lookup() {
        let compiler = Compiler::default();
        let Err(KlassError::Compile { err, sources }) =
            compiler.compile_source("qa.klass", "package qa\nclass Question { title: Strin; }")
        else {
            panic!("Expected a compile error");
        };

        let diagnostic = &err.diagnostics()[0];
        let (name, text) = sources.of(diagnostic).expect("diagnostic has a source");
        assert_eq!(name, "qa.klass");
        assert!(text.contains("Strin"));
    }
}
