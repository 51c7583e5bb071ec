//! Configuration types for Klass compilation.
//!
//! This module provides configuration structures that control what the
//! compiler reports and what a front end prints once a model is built. All
//! types implement [`serde::Deserialize`] for loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration combining compiler and output settings.
//! - [`CompilerConfig`] - Switches that change which diagnostics a compilation reports.
//! - [`OutputConfig`] - Controls what is printed about a successfully built model.
//!
//! # Example
//!
//! ```
//! # use klass::config::AppConfig;
//! // Use default configuration
//! let config = AppConfig::default();
//! assert!(!config.compiler().warnings_as_errors());
//! assert!(config.output().summary());
//! ```

use serde::Deserialize;

use klass_compiler::CompileOptions;

/// Top-level application configuration combining compiler and output settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Compiler configuration section.
    #[serde(default)]
    compiler: CompilerConfig,

    /// Output configuration section.
    #[serde(default)]
    output: OutputConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified compiler and output configurations.
    pub fn new(compiler: CompilerConfig, output: OutputConfig) -> Self {
        Self { compiler, output }
    }

    /// Returns the compiler configuration.
    pub fn compiler(&self) -> &CompilerConfig {
        &self.compiler
    }

    /// Returns the output configuration.
    pub fn output(&self) -> &OutputConfig {
        &self.output
    }
}

/// Switches that change which diagnostics a compilation reports.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Treat every warning as an error. A compilation with warnings then
    /// produces no domain model.
    warnings_as_errors: bool,

    /// Warn about private properties that no member path names.
    report_unreferenced_private_properties: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            warnings_as_errors: false,
            report_unreferenced_private_properties: true,
        }
    }
}

impl CompilerConfig {
    /// Creates a new [`CompilerConfig`].
    ///
    /// # Arguments
    ///
    /// * `warnings_as_errors` - Promote warnings to errors.
    /// * `report_unreferenced_private_properties` - Report private properties nothing references.
    pub fn new(warnings_as_errors: bool, report_unreferenced_private_properties: bool) -> Self {
        Self {
            warnings_as_errors,
            report_unreferenced_private_properties,
        }
    }

    pub fn warnings_as_errors(&self) -> bool {
        self.warnings_as_errors
    }

    pub fn report_unreferenced_private_properties(&self) -> bool {
        self.report_unreferenced_private_properties
    }

    /// The [`CompileOptions`] these settings stand for.
    pub fn options(&self) -> CompileOptions {
        CompileOptions {
            report_unreferenced_private_properties: self.report_unreferenced_private_properties,
            warnings_as_errors: self.warnings_as_errors,
        }
    }
}

/// Controls what is printed about a successfully built model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Log the number of elements of each kind in the built model.
    summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { summary: true }
    }
}

impl OutputConfig {
    pub fn new(summary: bool) -> Self {
        Self { summary }
    }

    pub fn summary(&self) -> bool {
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiler_options_follow_config() {
        let options = CompilerConfig::new(true, false).options();
        assert!(options.warnings_as_errors);
        assert!(!options.report_unreferenced_private_properties);

        assert_eq!(CompilerConfig::default().options(), CompileOptions::default());
    }
}
