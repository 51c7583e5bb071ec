//! Integration tests for the Compiler API
//!
//! These tests verify that the public API works and is usable.

use std::fs;

use tempfile::tempdir;

use klass::{
    AnnotationCode, Compiler, KlassError,
    config::{AppConfig, CompilerConfig, OutputConfig},
};

const QUESTION: &str = r#"
package com.example.qa

class Question
{
    id: Long key id;
    title: String maxLength(256);
    notes: String private;
}
"#;

#[test]
fn test_compiler_api_exists() {
    // Just verify the API compiles and can be constructed
    let _compiler = Compiler::default();
}

#[test]
fn test_compile_simple_model() {
    let compiler = Compiler::default();
    let result = compiler.compile_source("qa.klass", QUESTION);
    assert!(
        result.is_ok(),
        "Should compile valid model: {:?}",
        result.err()
    );

    let compiled = result.unwrap();
    assert!(compiled.model().find_classifier("Question").is_some());
    // `notes` is private and never referenced.
    let codes: Vec<_> = compiled
        .warnings()
        .iter()
        .filter_map(|warning| warning.code())
        .collect();
    assert_eq!(codes, [AnnotationCode::WrnPrvUnr]);
}

#[test]
fn test_warnings_as_errors_config() {
    let config = AppConfig::new(CompilerConfig::new(true, true), OutputConfig::default());
    let compiler = Compiler::new(config);

    match compiler.compile_source("qa.klass", QUESTION) {
        Err(KlassError::Compile { err, .. }) => assert_eq!(err.error_count(), 1),
        other => panic!("Expected compile error, got {other:?}"),
    }
}

#[test]
fn test_config_from_toml() {
    let config: AppConfig = toml::from_str(
        r#"
        [compiler]
        report_unreferenced_private_properties = false

        [output]
        summary = false
        "#,
    )
    .expect("Failed to parse config");

    assert!(!config.compiler().report_unreferenced_private_properties());
    assert!(!config.compiler().warnings_as_errors());
    assert!(!config.output().summary());

    let compiled = Compiler::new(config)
        .compile_source("qa.klass", QUESTION)
        .expect("Failed to compile");
    assert!(compiled.warnings().is_empty());
}

#[test]
fn test_compile_files_as_one_model() {
    let dir = tempdir().expect("Failed to create temp directory");
    let question = dir.path().join("question.klass");
    let answer = dir.path().join("answer.klass");
    fs::write(&question, QUESTION).unwrap();
    fs::write(
        &answer,
        r#"
        package com.example.qa

        class Answer { id: Long key id; questionId: Long final; }

        association QuestionHasAnswers
        {
            question: Question[1..1] final;
            answers: Answer[0..*] owned;

            relationship this.id == Answer.questionId
        }
        "#,
    )
    .unwrap();

    let compiled = Compiler::default()
        .compile_files([&question, &answer])
        .expect("Failed to compile");
    assert_eq!(compiled.sources().len(), 2);
    assert!(compiled.model().find_association("QuestionHasAnswers").is_some());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().expect("Failed to create temp directory");
    let result = Compiler::default().compile_files([dir.path().join("missing.klass")]);
    assert!(matches!(result, Err(KlassError::Io(_))));
}

#[test]
fn test_compile_error_carries_sources() {
    let source = "package qa\nclass Question { id: Long key id; answer: Answr; }";
    let Err(KlassError::Compile { err, sources }) =
        Compiler::default().compile_source("qa.klass", source)
    else {
        panic!("Expected a compile error");
    };

    let diagnostic = &err.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(AnnotationCode::ErrPrpTyp));
    let location = diagnostic.location().expect("diagnostic is located");
    assert_eq!((location.line(), location.column()), (2, 43));
    assert_eq!(sources.of(diagnostic).map(|(name, _)| name), Some("qa.klass"));
}
