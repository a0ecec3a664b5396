//! Golden-file test harness for comprehend.
//!
//! Discovers `.input.js` / `.input.ts` files under `tests/fixtures/`, compiles
//! them, and compares the output against the matching `.expected.*` file.
//! Both sides are parsed and printed minified before comparing, so the
//! expected files only have to agree on code, not on layout.
//!
//! Files under `tests/fixtures/roundtrip/` have no expected output; their
//! compiled output just has to parse as plain ECMAScript/TypeScript, in both
//! print modes.
//!
//! Files under `tests/fixtures/runtime/` are compiled in both print modes
//! and run with `node`; what they print must match the `.expected.txt` file
//! next to them. The suite is skipped when `node` is not installed.
//!
//! Set `CP_UPDATE_FIXTURES=1` to overwrite expected files with actual output.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use cp_ast::CpSyntax;
use cp_compile::{compile, CompileOptions, PrintMode};
use cp_parser::parse_comprehensions;
use swc_ecma_codegen::{text_writer::JsWriter, Config, Emitter, Node};

const INPUT_SUFFIXES: &[(&str, &str)] = &[
    (".input.js", ".expected.js"),
    (".input.ts", ".expected.ts"),
];

fn fixtures_dir() -> PathBuf {
    // CARGO_MANIFEST_DIR is crates/cp_test/, so go up two levels to workspace root.
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join("tests")
        .join("fixtures")
}

fn expected_path(input: &Path) -> Option<PathBuf> {
    let name = input.to_str()?;
    INPUT_SUFFIXES.iter().find_map(|(input_suffix, expected_suffix)| {
        name.strip_suffix(input_suffix)
            .map(|stem| PathBuf::from(format!("{stem}{expected_suffix}")))
    })
}

fn collect_input_files(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                files.extend(collect_input_files(&path, true));
            }
        } else if expected_path(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();
    files
}

fn plain_syntax(filename: &str) -> CpSyntax {
    CpSyntax {
        comprehensions: false,
        ..CpSyntax::for_file(filename)
    }
}

/// Parse `source` without comprehension support and print it minified.
fn normalize(source: &str, filename: &str) -> Result<String> {
    let parsed = parse_comprehensions(source, filename, &plain_syntax(filename))?;

    let mut buf = Vec::new();
    {
        let writer = JsWriter::new(parsed.source_map.clone(), "\n", &mut buf, None);
        let mut emitter = Emitter {
            cfg: Config::default().with_minify(true),
            cm: parsed.source_map.clone(),
            comments: None,
            wr: writer,
        };
        parsed.module.emit_with(&mut emitter)?;
    }

    Ok(String::from_utf8(buf)?)
}

fn run_compile(source: &str, filename: &str, print_mode: PrintMode) -> Result<String> {
    let options = CompileOptions {
        print_mode,
        ..CompileOptions::new(filename)
    };
    Ok(compile(source, &options)?.code)
}

fn test_name(fixtures: &Path, path: &Path) -> String {
    path.strip_prefix(fixtures)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn check_golden(input_path: &Path, update: bool) -> Result<()> {
    let filename = input_path.display().to_string();
    let expected_path = expected_path(input_path).context("not a fixture input")?;

    let source = std::fs::read_to_string(input_path).context("failed to read input")?;
    let actual = run_compile(&source, &filename, PrintMode::Preserve).context("compile failed")?;

    if update {
        std::fs::write(&expected_path, &actual).context("failed to write expected")?;
        return Ok(());
    }

    let expected = std::fs::read_to_string(&expected_path)
        .with_context(|| format!("missing expected file: {}", expected_path.display()))?;

    let actual_code = normalize(&actual, &filename)
        .with_context(|| format!("output does not parse\n--- output ---\n{}", actual.trim()))?;
    let expected_code = normalize(&expected, &filename).context("expected file does not parse")?;

    anyhow::ensure!(
        actual_code == expected_code,
        "output mismatch\n--- expected ---\n{}\n--- actual ---\n{}",
        expected.trim(),
        actual.trim()
    );
    Ok(())
}

fn check_roundtrip(input_path: &Path) -> Result<()> {
    let filename = input_path.display().to_string();
    let source = std::fs::read_to_string(input_path).context("failed to read")?;

    for mode in [PrintMode::Preserve, PrintMode::Reprint] {
        let output = run_compile(&source, &filename, mode)
            .with_context(|| format!("{mode:?} compile failed"))?;
        parse_comprehensions(&output, &filename, &plain_syntax(&filename)).with_context(|| {
            format!(
                "{mode:?} output is not plain code\n--- output ---\n{}",
                output.trim()
            )
        })?;
    }
    Ok(())
}

fn node_available() -> bool {
    Command::new("node")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

/// Run `code` as a script and return what it printed.
fn run_node(code: &str) -> Result<String> {
    let mut child = Command::new("node")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("failed to start node")?;
    child
        .stdin
        .take()
        .context("node has no stdin")?
        .write_all(code.as_bytes())?;
    let output = child.wait_with_output()?;
    anyhow::ensure!(
        output.status.success(),
        "node failed:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(String::from_utf8(output.stdout)?)
}

fn check_runtime(input_path: &Path) -> Result<()> {
    let filename = input_path.display().to_string();
    let expected_path = filename
        .strip_suffix(".input.js")
        .map(|stem| PathBuf::from(format!("{stem}.expected.txt")))
        .context("runtime fixtures must be .input.js files")?;

    let source = std::fs::read_to_string(input_path).context("failed to read input")?;
    let expected = std::fs::read_to_string(&expected_path)
        .with_context(|| format!("missing expected file: {}", expected_path.display()))?;

    for mode in [PrintMode::Preserve, PrintMode::Reprint] {
        let output = run_compile(&source, &filename, mode)
            .with_context(|| format!("{mode:?} compile failed"))?;
        let printed = run_node(&output)
            .with_context(|| format!("{mode:?} output\n--- output ---\n{}", output.trim()))?;
        anyhow::ensure!(
            printed.trim() == expected.trim(),
            "{mode:?} output printed the wrong values\n--- expected ---\n{}\n--- actual ---\n{}",
            expected.trim(),
            printed.trim()
        );
    }
    Ok(())
}

#[test]
fn golden_file_tests() {
    let fixtures = fixtures_dir();
    let input_files = collect_input_files(&fixtures, false);

    assert!(
        !input_files.is_empty(),
        "No test fixtures found in {}",
        fixtures.display()
    );

    let update_mode = std::env::var("CP_UPDATE_FIXTURES").is_ok();
    let failures: Vec<String> = input_files
        .iter()
        .filter_map(|path| {
            check_golden(path, update_mode)
                .err()
                .map(|err| format!("{}: {err:#}", test_name(&fixtures, path)))
        })
        .collect();

    if !failures.is_empty() {
        panic!(
            "\n{} golden test(s) failed:\n\n{}",
            failures.len(),
            failures.join("\n\n")
        );
    }
}

#[test]
fn roundtrip_tests() {
    let fixtures = fixtures_dir().join("roundtrip");
    let input_files = collect_input_files(&fixtures, true);

    assert!(
        !input_files.is_empty(),
        "No roundtrip fixtures found in {}",
        fixtures.display()
    );

    let failures: Vec<String> = input_files
        .iter()
        .filter_map(|path| {
            check_roundtrip(path)
                .err()
                .map(|err| format!("{}: {err:#}", test_name(&fixtures, path)))
        })
        .collect();

    if !failures.is_empty() {
        panic!(
            "\n{} roundtrip test(s) failed:\n\n{}",
            failures.len(),
            failures.join("\n\n")
        );
    }
}

#[test]
fn runtime_tests() {
    if !node_available() {
        eprintln!("node not found, skipping runtime tests");
        return;
    }

    let fixtures = fixtures_dir().join("runtime");
    let input_files = collect_input_files(&fixtures, false);
    assert!(
        !input_files.is_empty(),
        "No runtime fixtures found in {}",
        fixtures.display()
    );

    let failures: Vec<String> = input_files
        .iter()
        .filter_map(|path| {
            check_runtime(path)
                .err()
                .map(|err| format!("{}: {err:#}", test_name(&fixtures, path)))
        })
        .collect();

    if !failures.is_empty() {
        panic!(
            "\n{} runtime test(s) failed:\n\n{}",
            failures.len(),
            failures.join("\n\n")
        );
    }
}
