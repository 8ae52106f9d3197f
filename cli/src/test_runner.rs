use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use onsong::ast::Warning;
use song::{Song, SongEntry};

const EXTENSION: &str = ".test.onsong";

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// If true, the chart must fail to parse.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// The parse error's Display string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Metatag name -> expected value, as printed.
    #[serde(default)]
    pub expect_metadata: Option<BTreeMap<String, String>>,

    /// Play order: section names, with instructions written as `(text)`.
    #[serde(default)]
    pub expect_sections: Option<Vec<String>>,

    /// If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Split a fixture into its TOML front matter and the chart source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    // Keep the newline after the opening delimiter so an empty front
    // matter still has a `\n---` to find.
    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
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

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(EXTENSION))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    let description = config.description.clone();
    match check(&config, source) {
        Ok(()) => TestResult {
            path: path.to_path_buf(),
            description,
            outcome: TestOutcome::Pass,
        },
        Err(reason) => fail(description, reason),
    }
}

/// Parse `source` and compare against every expectation in `config`.
fn check(config: &TestConfig, source: &str) -> Result<(), String> {
    let expects_error = config.expect_parse_error || config.expect_error.is_some();

    let song = match Song::parse(source) {
        Ok(song) if expects_error => {
            return Err(format!(
                "expected parse error, but parsing succeeded with {} section(s)",
                song.sections().count()
            ));
        }
        Ok(song) => song,
        Err(error) => {
            let message = error.to_string();
            return match &config.expect_error {
                Some(expected) if !message.contains(expected.as_str()) => Err(format!(
                    "expected error containing \"{}\", got: {}",
                    expected, message
                )),
                _ if expects_error => Ok(()),
                _ => Err(format!(
                    "unexpected parse error on line {}: {}",
                    byte_offset_to_line(source, error.span.start),
                    message
                )),
            };
        }
    };

    if let Some(expected) = &config.expect_metadata {
        check_metadata(&song, expected)?;
    }
    if let Some(expected) = &config.expect_sections {
        check_sections(&song, expected)?;
    }
    if let Some(expected) = &config.expect_warnings {
        check_warnings(source, song.warnings(), expected)?;
    }
    Ok(())
}

fn check_metadata(song: &Song, expected: &BTreeMap<String, String>) -> Result<(), String> {
    let metadata = song.metadata();
    for (name, value) in expected {
        match metadata.get(name) {
            Some(actual) if actual.to_string() == *value => {}
            Some(actual) => {
                return Err(format!(
                    "metatag `{}`: expected \"{}\", got \"{}\"",
                    name, value, actual
                ));
            }
            None => return Err(format!("metatag `{}` is missing", name)),
        }
    }
    Ok(())
}

fn check_sections(song: &Song, expected: &[String]) -> Result<(), String> {
    let actual: Vec<String> = song
        .sections()
        .map(|entry| match entry {
            SongEntry::Section(section) => section.name().unwrap_or("").to_string(),
            SongEntry::Instruction(instruction) => instruction.to_string(),
        })
        .collect();
    if actual == expected {
        Ok(())
    } else {
        Err(format!(
            "section order mismatch\n  expected: {:?}\n  actual:   {:?}",
            expected, actual
        ))
    }
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

fn check_warnings(
    source: &str,
    warnings: &[Warning],
    expected: &[ExpectedWarning],
) -> Result<(), String> {
    if warnings.len() != expected.len() {
        let actual: Vec<String> = warnings.iter().map(|w| format!("  - {}", w)).collect();
        return Err(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            warnings.len(),
            if actual.is_empty() {
                "    (none)".to_string()
            } else {
                actual.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in warnings.iter().zip(expected).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Err(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual
            ));
        }
        if let Some(expected_line) = expected.line {
            let actual_line = byte_offset_to_line(source, actual.span.start);
            if actual_line != expected_line {
                return Err(format!(
                    "warning[{}]: expected on line {}, but span is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }
    Ok(())
}

/// Fixture files grouped by subfolder relative to `root`; files directly in
/// `root` get category "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_fixture = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(EXTENSION));
        if is_fixture {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

/// Keep the categories named in `requested` (a name also selects its
/// subcategories). Empty `requested` keeps everything.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }
    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let prefix = format!("{}/", request);
        let before = selected.len();
        for (category, files) in all {
            if category == request || category.starts_with(&prefix) {
                selected.insert(category.as_str(), files);
            }
        }
        if selected.len() == before {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    selected
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", EXTENSION, path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

fn paint(text: &str, code: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

/// Run every fixture under `path` (or the single file `path`), optionally
/// restricted to `categories`. Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let groups: Vec<(String, Vec<PathBuf>)> = if path.is_file() {
        vec![(String::new(), vec![path.to_path_buf()])]
    } else {
        let all = discover_categorized(path);
        if all.is_empty() {
            eprintln!("no {} files found in {}", EXTENSION, path.display());
            return 1;
        }
        let selected = select_categories(&all, categories);
        if selected.is_empty() {
            eprintln!("no matching categories found");
            return 1;
        }
        selected
            .into_iter()
            .map(|(category, files)| (category.to_string(), files.clone()))
            .collect()
    };

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (category, files) in &groups {
        if !path.is_file() {
            eprintln!();
            eprintln!("{}", paint(category_label(category), "1", no_color));
        }
        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", paint("PASS", "32", no_color), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", paint("FAIL", "31", no_color), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", paint("ok", "32", no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}
