use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use engine::pass;
use engine::scope::Scope;

use crate::host;

#[derive(Debug, Deserialize)]
pub struct CaseConfig {
    /// Human-readable case description.
    #[serde(default)]
    pub description: Option<String>,

    /// 0-based indices of blocks being edited during the pass.
    #[serde(default)]
    pub focus: Vec<usize>,

    /// Seed values for the global scope.
    #[serde(default)]
    pub globals: BTreeMap<String, f64>,

    /// Expected rendered document text (trimmed comparison).
    #[serde(default)]
    pub expect_text: Option<String>,

    /// Expected number of overlay rules produced by the pass.
    #[serde(default)]
    pub expect_rule_count: Option<usize>,
}

/// Parse a `.case.txt` file into its TOML frontmatter and document text.
fn parse_case_file(content: &str) -> Result<(CaseConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest_start = close_pos + 4; // skip \n---
    let source = after_open[rest_start..]
        .strip_prefix("\r\n")
        .or_else(|| after_open[rest_start..].strip_prefix('\n'))
        .unwrap_or(&after_open[rest_start..]);

    let config: CaseConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum CaseOutcome {
    Pass,
    Fail(String),
}

/// Run one case: build the snapshot, seed the globals, run a pass, compare.
fn run_case(content: &str) -> CaseOutcome {
    let (config, source) = match parse_case_file(content) {
        Ok(parsed) => parsed,
        Err(err) => return CaseOutcome::Fail(format!("invalid case file: {}", err)),
    };

    let mut document = host::parse_document(source);
    host::mark_focused(&mut document, &config.focus);

    let mut global = Scope::new();
    for (name, value) in &config.globals {
        global.set(name, *value);
    }

    let outcome = pass::run(&document, &global);

    if let Some(expected) = config.expect_rule_count {
        if outcome.rules.len() != expected {
            return CaseOutcome::Fail(format!(
                "expected {} overlay rules, got {}",
                expected,
                outcome.rules.len()
            ));
        }
    }

    if let Some(expected) = &config.expect_text {
        let rendered = host::render_text(&document, &global);
        if rendered.trim() != expected.trim() {
            return CaseOutcome::Fail(format!(
                "rendered text mismatch\n--- expected ---\n{}\n--- got ---\n{}",
                expected.trim(),
                rendered.trim()
            ));
        }
    }

    CaseOutcome::Pass
}

/// Collect every `.case.txt` file under a path (a single file or a
/// directory walked recursively), sorted by path.
fn collect_cases(path: &Path) -> Vec<PathBuf> {
    let mut cases = Vec::new();
    if path.is_file() {
        cases.push(path.to_path_buf());
        return cases;
    }
    let Ok(entries) = std::fs::read_dir(path) else {
        return cases;
    };
    let mut entries: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
    entries.sort();
    for entry in entries {
        if entry.is_dir() {
            cases.extend(collect_cases(&entry));
        } else if entry
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".case.txt"))
        {
            cases.push(entry);
        }
    }
    cases
}

/// Run all cases under `path`. Returns the process exit code.
pub fn run_cases(path: &Path) -> i32 {
    let cases = collect_cases(path);
    if cases.is_empty() {
        eprintln!("no .case.txt files under {}", path.display());
        return 1;
    }

    let mut failed = 0;
    for case in &cases {
        let name = case.display();
        let content = match std::fs::read_to_string(case) {
            Ok(content) => content,
            Err(err) => {
                println!("FAIL {}: cannot read: {}", name, err);
                failed += 1;
                continue;
            }
        };
        match run_case(&content) {
            CaseOutcome::Pass => println!("PASS {}", name),
            CaseOutcome::Fail(reason) => {
                println!("FAIL {}: {}", name, reason);
                failed += 1;
            }
        }
    }

    println!("\n{} passed, {} failed", cases.len() - failed, failed);
    if failed > 0 { 1 } else { 0 }
}
