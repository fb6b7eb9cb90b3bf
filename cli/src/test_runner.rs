use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use narrative::Narrative;
use narrative::config::NarrativeConfig;
use narrative::parser::{ParseError, Parser};

const FIXTURE_SUFFIX: &str = ".narrative.md";
const EXPECT_SUFFIX: &str = ".expect.toml";

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

/// Contents of a fixture's `.expect.toml`. Every check is optional.
#[derive(Debug, Default, Deserialize)]
pub struct Expectations {
    /// Human-readable fixture description.
    #[serde(default)]
    pub description: Option<String>,

    /// The parse must fail with a message containing this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Number of blocks, title page included.
    #[serde(default)]
    pub expect_blocks: Option<usize>,

    /// Dataset of each block, in order.
    #[serde(default)]
    pub expect_datasets: Option<Vec<String>>,

    /// Query of each block, in order.
    #[serde(default)]
    pub expect_queries: Option<Vec<String>>,

    /// Indices of the blocks that carry main display markdown.
    #[serde(default)]
    pub expect_main_display: Option<Vec<usize>>,

    /// Expected warnings. If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

fn expectations_path(fixture: &Path) -> PathBuf {
    let name = fixture
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stem = name.strip_suffix(FIXTURE_SUFFIX).unwrap_or(name);
    fixture.with_file_name(format!("{}{}", stem, EXPECT_SUFFIX))
}

/// Load the fixture's expectations. A fixture without one only has to parse.
fn load_expectations(fixture: &Path) -> Result<Expectations, String> {
    let path = expectations_path(fixture);
    if !path.exists() {
        return Ok(Expectations::default());
    }
    let text = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    toml::from_str(&text).map_err(|e| format!("TOML parse error in {}: {}", path.display(), e))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path, config: &NarrativeConfig) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let source = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };
    let expectations = match load_expectations(path) {
        Ok(e) => e,
        Err(e) => return fail(None, format!("expectations error: {}", e)),
    };
    let description = expectations.description.clone();

    let parse_result = Parser::with_config(source.clone(), 0, config.clone()).parse();

    let reason = match (&expectations.expect_error, parse_result) {
        (Some(expected), Err(err)) => {
            if err.message.contains(expected.as_str()) || err.kind.to_string().contains(expected.as_str()) {
                None
            } else {
                Some(format!(
                    "expected error containing \"{}\", got: {}",
                    expected, err.message
                ))
            }
        }
        (Some(expected), Ok(_)) => Some(format!(
            "expected error containing \"{}\", but parsing succeeded",
            expected
        )),
        (None, Err(err)) => Some(format!("unexpected parse error: {}", err.message)),
        (None, Ok(narrative)) => check_narrative(&source, &narrative, &expectations),
    };

    match reason {
        Some(reason) => fail(description, reason),
        None => TestResult {
            path: path.to_path_buf(),
            description,
            outcome: TestOutcome::Pass,
        },
    }
}

/// Compare a successful parse with the expectations. Returns `Some(reason)` on mismatch.
fn check_narrative(source: &str, narrative: &Narrative, expected: &Expectations) -> Option<String> {
    let blocks = &narrative.blocks;

    if let Some(count) = expected.expect_blocks {
        if blocks.len() != count {
            return Some(format!("expected {} block(s), got {}", count, blocks.len()));
        }
    }

    if let Some(datasets) = &expected.expect_datasets {
        let actual: Vec<&str> = blocks.iter().map(|b| b.dataset()).collect();
        if actual != *datasets {
            return Some(format!(
                "dataset mismatch\n  expected: {:?}\n  actual:   {:?}",
                datasets, actual
            ));
        }
    }

    if let Some(queries) = &expected.expect_queries {
        let actual: Vec<&str> = blocks.iter().map(|b| b.query()).collect();
        if actual != *queries {
            return Some(format!(
                "query mismatch\n  expected: {:?}\n  actual:   {:?}",
                queries, actual
            ));
        }
    }

    if let Some(indices) = &expected.expect_main_display {
        let actual: Vec<usize> = blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.main_display_markdown().is_some())
            .map(|(i, _)| i)
            .collect();
        if actual != *indices {
            return Some(format!(
                "main display blocks mismatch\n  expected: {:?}\n  actual:   {:?}",
                indices, actual
            ));
        }
    }

    if let Some(warnings) = &expected.expect_warnings {
        return check_warnings(source, &narrative.warnings, warnings);
    }

    None
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(
    source: &str,
    warnings: &[ParseError],
    expected: &[ExpectedWarning],
) -> Option<String> {
    if warnings.len() != expected.len() {
        let actual_msgs: Vec<String> = warnings.iter().map(|w| format!("  - {}", w)).collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            warnings.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in warnings.iter().zip(expected.iter()).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual.message
            ));
        }

        if let Some(expected_line) = expected.line {
            let actual_line = byte_offset_to_line(source, actual.span.start);
            if actual_line != expected_line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but span is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }

    None
}

/// Discover fixtures grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_fixtures(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_fixtures(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_fixtures(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(FIXTURE_SUFFIX) {
                let category = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                out.entry(category).or_default().push(path);
            }
        }
    }
}

/// List available categories for the given fixture path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} fixtures)", label, files.len());
    }
}

fn pass_label(no_color: bool) -> &'static str {
    if no_color { "PASS" } else { "\x1b[32mPASS\x1b[0m" }
}

fn fail_label(no_color: bool) -> &'static str {
    if no_color { "FAIL" } else { "\x1b[31mFAIL\x1b[0m" }
}

fn bold(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[1m{}\x1b[0m", s)
    }
}

fn label_for(result: &TestResult) -> &str {
    result.description.as_deref().unwrap_or_else(|| {
        result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_suffix(FIXTURE_SUFFIX))
            .unwrap_or("?")
    })
}

/// Keep the categories named on the command line (a name also selects its subfolders).
fn filter_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }
    let mut filtered = BTreeMap::new();
    for requested in requested {
        let req = requested.trim_matches('/');
        let mut found = false;
        for (cat, files) in all {
            if cat == req || cat.starts_with(&format!("{}/", req)) {
                filtered.insert(cat.as_str(), files);
                found = true;
            }
        }
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    filtered
}

/// Run every fixture under `path` (or a single fixture).
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(
    path: &Path,
    no_color: bool,
    categories: &[String],
    config: &NarrativeConfig,
) -> i32 {
    let run_categories: BTreeMap<String, Vec<PathBuf>> = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all = discover_categorized(path);
        if all.is_empty() {
            eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
            return 1;
        }
        filter_categories(&all, categories)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    };

    if run_categories.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let (passed, failures) = run_all(&run_categories, no_color, config);
    report(passed, &failures, no_color)
}

fn run_all(
    categories: &BTreeMap<String, Vec<PathBuf>>,
    no_color: bool,
    config: &NarrativeConfig,
) -> (usize, Vec<TestResult>) {
    let mut passed = 0usize;
    let mut failures = Vec::new();

    for (cat, files) in categories {
        let header = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!();
        eprintln!("{}", bold(header, no_color));

        for file in files {
            let result = run_single_test(file, config);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", pass_label(no_color), label_for(&result));
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", fail_label(no_color), label_for(&result));
                    failures.push(result);
                }
            }
        }
    }

    (passed, failures)
}

fn report(passed: usize, failures: &[TestResult], no_color: bool) -> i32 {
    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        let ok = if no_color { "ok" } else { "\x1b[32mok\x1b[0m" };
        eprintln!("test result: {}. {} passed, 0 failed", ok, passed);
        0
    } else {
        let bad = if no_color { "FAILED" } else { "\x1b[31mFAILED\x1b[0m" };
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            bad,
            passed,
            failed,
            passed + failed
        );
        1
    }
}
