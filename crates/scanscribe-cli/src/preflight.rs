// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dependency preflight for `scanscribe doctor`.
//
// Runs every check regardless of earlier failures: configuration, page
// renderer, PDF info tool, tesseract location, tesseract version, input folder. Failed checks
// carry a concrete fix; the report ends with installation instructions.

use std::path::{Path, PathBuf};
use std::process::Command;

use scanscribe_core::AppConfig;
use scanscribe_core::human_errors::humanize_error;
use tracing::debug;

/// Oldest tesseract with the LSTM engine modes (`--oem 1..=3`).
pub const MIN_TESSERACT_VERSION: Version = Version(4, 0, 0);

/// Result of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Check name shown to the user.
    pub name: String,
    pub passed: bool,
    /// What was found.
    pub detail: String,
    /// What to do if the check failed.
    pub fix: Option<String>,
}

impl CheckResult {
    fn pass(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: detail.into(),
            fix: None,
        }
    }

    fn fail(name: &str, detail: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: detail.into(),
            fix: Some(fix.into()),
        }
    }
}

/// Full preflight report.
#[derive(Debug, Clone)]
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    /// Text shown by `scanscribe doctor`.
    pub fn render(&self) -> String {
        let mut text = String::new();
        for check in &self.checks {
            let marker = if check.passed { "[ok]" } else { "[!!]" };
            text.push_str(&format!("{marker} {}: {}\n", check.name, check.detail));
            if let Some(ref fix) = check.fix {
                text.push_str(&format!("     fix: {fix}\n"));
            }
        }
        text.push('\n');
        if self.all_passed() {
            text.push_str("All dependencies and prerequisites are met. Ready to convert.\n");
        } else {
            text.push_str("Some dependencies or prerequisites are missing or misconfigured.\n");
            text.push_str(INSTALLATION_INSTRUCTIONS);
        }
        text
    }
}

pub const INSTALLATION_INSTRUCTIONS: &str = "
Installation instructions:
  Poppler (pdftoppm, pdfinfo) and Tesseract OCR:
    macOS (Homebrew):       brew install poppler tesseract
    Debian/Ubuntu:          sudo apt-get install poppler-utils tesseract-ocr
    Fedora:                 sudo dnf install poppler-utils tesseract
    Windows:                install Poppler and the UB Mannheim Tesseract build,
                            then set `pdftoppm_path` and `tesseract_path` in scanscribe.toml
  Extra languages: install the matching traineddata package (e.g. tesseract-ocr-deu).
";

/// Run every check against `config`.
pub fn run_preflight(config: &AppConfig) -> PreflightReport {
    let pdfinfo = sibling_tool(&config.pdftoppm_path, "pdfinfo");
    PreflightReport {
        checks: vec![
            check_config(config),
            check_tool("Page renderer", &config.pdftoppm_path, "-v"),
            check_tool("PDF info tool", &pdfinfo, "-v"),
            check_tesseract_path(&config.tesseract_path),
            check_tesseract_version(&config.tesseract_path),
            check_input_folder(&config.input_folder),
        ],
    }
}

fn check_config(config: &AppConfig) -> CheckResult {
    const NAME: &str = "Configuration";
    match config.validate() {
        Ok(()) => CheckResult::pass(NAME, "all values are valid"),
        Err(err) => CheckResult::fail(NAME, err.to_string(), humanize_error(&err).suggestion),
    }
}

/// `pdfinfo` next to a configured `pdftoppm`, or on `PATH` when pdftoppm is bare.
fn sibling_tool(program: &Path, name: &str) -> PathBuf {
    match program.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(name),
        _ => PathBuf::from(name),
    }
}

/// A poppler tool passes when it exits cleanly or prints its version banner.
///
/// Older poppler releases exit non-zero for `-v` even though they run fine.
fn check_tool(name: &str, program: &Path, arg: &str) -> CheckResult {
    match Command::new(program).arg(arg).output() {
        Ok(output) => {
            let banner = format!(
                "{}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
            debug!(program = %program.display(), status = %output.status, "Tool probed");
            if output.status.success() || banner.to_ascii_lowercase().contains("version") {
                let first_line = banner.lines().next().unwrap_or("").trim().to_string();
                CheckResult::pass(name, format!("{} runs ({})", program.display(), first_line))
            } else {
                CheckResult::fail(
                    name,
                    format!("{} exited with {}", program.display(), output.status),
                    "Reinstall poppler-utils.",
                )
            }
        }
        Err(err) => CheckResult::fail(
            name,
            format!("{} could not be run: {}", program.display(), err),
            "Install poppler-utils, or set `pdftoppm_path` in scanscribe.toml.",
        ),
    }
}

fn check_tesseract_path(path: &Path) -> CheckResult {
    const NAME: &str = "Tesseract executable";
    if path.is_file() {
        CheckResult::pass(NAME, format!("found at {}", path.display()))
    } else {
        CheckResult::fail(
            NAME,
            format!("not found at {}", path.display()),
            "Install tesseract, or set `tesseract_path` in scanscribe.toml.",
        )
    }
}

fn check_tesseract_version(path: &Path) -> CheckResult {
    const NAME: &str = "Tesseract version";
    let output = match Command::new(path).arg("--version").output() {
        Ok(output) => output,
        Err(err) => {
            return CheckResult::fail(
                NAME,
                format!("{} could not be run: {}", path.display(), err),
                "Install tesseract, or set `tesseract_path` in scanscribe.toml.",
            );
        }
    };

    // Tesseract 3.x printed its banner on stderr, later releases on stdout.
    let banner = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    match parse_tesseract_version(&banner) {
        Some(version) if version >= MIN_TESSERACT_VERSION => {
            CheckResult::pass(NAME, format!("tesseract {version}"))
        }
        Some(version) => CheckResult::fail(
            NAME,
            format!("tesseract {version} is older than {MIN_TESSERACT_VERSION}"),
            "Upgrade tesseract to 4.0 or newer.",
        ),
        None => CheckResult::fail(
            NAME,
            "could not read a version from `tesseract --version`",
            "Check that `tesseract_path` points at the tesseract OCR binary.",
        ),
    }
}

fn check_input_folder(folder: &Path) -> CheckResult {
    const NAME: &str = "Input folder";
    let has_entries = std::fs::read_dir(folder)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false);
    if has_entries {
        CheckResult::pass(NAME, format!("{} exists and contains files", folder.display()))
    } else {
        CheckResult::fail(
            NAME,
            format!("{} does not exist or is empty", folder.display()),
            "Put the scanned PDFs into `input_folder`, or point it at the right folder.",
        )
    }
}

/// Semantic version compared numerically, component by component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version(pub u32, pub u32, pub u32);

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.0, self.1, self.2)
    }
}

/// Extract the version from a `tesseract --version` banner.
///
/// Accepts `tesseract 5.3.0`, `tesseract v5.0.0-alpha.20210811` and
/// `tesseract 4.1.1-rc2-21-gf4ef`; missing components read as 0.
pub fn parse_tesseract_version(banner: &str) -> Option<Version> {
    let token = banner.lines().find_map(|line| {
        let mut words = line.split_whitespace();
        match words.next() {
            Some(first) if first.eq_ignore_ascii_case("tesseract") => words.next(),
            _ => None,
        }
    })?;

    let token = token.strip_prefix('v').unwrap_or(token);
    let mut parts = token.split('.').map(leading_number);
    let major = parts.next().flatten()?;
    let minor = parts.next().flatten().unwrap_or(0);
    let patch = parts.next().flatten().unwrap_or(0);
    Some(Version(major, minor, patch))
}

fn leading_number(part: &str) -> Option<u32> {
    let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
