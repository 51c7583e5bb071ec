use std::{fs, path::PathBuf};

use tempfile::tempdir;

use klass_cli::{Args, run};

/// Collects all .klass files from a directory
fn collect_klass_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("klass")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

/// The demos directory at the workspace root
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn args(inputs: &[PathBuf], output: Option<PathBuf>) -> Args {
    Args {
        inputs: inputs
            .iter()
            .map(|path| path.to_string_lossy().to_string())
            .collect(),
        output: output.map(|path| path.to_string_lossy().to_string()),
        config: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let valid_demos = collect_klass_files(demos_path());

    assert!(!valid_demos.is_empty(), "No valid demos found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &valid_demos {
        let output_filename = format!(
            "{}.txt",
            demo_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(output_filename);

        match run(&args(std::slice::from_ref(demo_path), Some(output_path.clone()))) {
            Ok(_) => {
                let outline = fs::read_to_string(&output_path).expect("Outline should be written");
                assert!(outline.contains("class "), "Outline of {} is empty", demo_path.display());
            }
            Err(e) => failed_demos.push((demo_path.clone(), e)),
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, err) in &failed_demos {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid demo(s) failed unexpectedly", failed_demos.len());
    }

    println!("✅ All {} valid demos passed", valid_demos.len());
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let error_demos = collect_klass_files(demos_path().join("errors"));

    assert!(
        !error_demos.is_empty(),
        "No error demos found in demos/errors/"
    );

    let mut unexpectedly_succeeded = Vec::new();

    for demo_path in &error_demos {
        let output_filename = format!(
            "error_{}.txt",
            demo_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(output_filename);

        if run(&args(std::slice::from_ref(demo_path), Some(output_path.clone()))).is_ok() {
            unexpectedly_succeeded.push(demo_path.clone());
        }
        assert!(
            !output_path.exists(),
            "No outline should be written for {}",
            demo_path.display()
        );
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }

    println!(
        "✅ All {} error demos failed as expected",
        error_demos.len()
    );
}

#[test]
fn e2e_demos_compile_together() {
    let demos = collect_klass_files(demos_path());
    let compiled = run(&args(&demos, None)).expect("Demos should compile as one model");

    assert!(compiled.sources().len() >= demos.len());
    assert!(compiled.model().find_classifier("Product").is_some());
    assert!(compiled.model().find_classifier("QuestionVersion").is_some());
}
