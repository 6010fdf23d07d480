use anyhow::{Context, Result, bail};
use casebook::{CaseLoader, CaseRepository, find_repo_root};
use serde_json::{Value, json};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

pub fn repo_root() -> PathBuf {
    find_repo_root().expect("tests require repository root")
}

pub fn corpus_dir() -> PathBuf {
    repo_root().join("corpus")
}

pub fn loader() -> CaseLoader {
    CaseLoader::with_embedded_schema().expect("embedded case schema compiles")
}

pub fn repository() -> CaseRepository {
    CaseRepository::new(loader())
}

/// The `casebook` binary with casebook-specific environment cleared.
pub fn casebook_command() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_casebook"));
    for var in [
        "CASEBOOK_ROOT",
        "CASEBOOK_CORPUS",
        "CASEBOOK_CASE_SCHEMA",
        "CASEBOOK_EXTRA_CATEGORIES",
        "CASEBOOK_LOG",
        "CASEBOOK_LOG_FORMAT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

/// Run `cmd` with `input` on stdin and return its output regardless of status.
pub fn run_with_stdin(mut cmd: Command, input: &str) -> Result<Output> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn {:?}", cmd))?;
    child
        .stdin
        .take()
        .context("child stdin unavailable")?
        .write_all(input.as_bytes())?;
    Ok(child.wait_with_output()?)
}

/// A minimal schema-valid case.
pub fn fixture_case(id: &str, category: &str, difficulty: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Case {id}"),
        "subtitle": "Fixture incident",
        "difficulty": difficulty,
        "category": category,
        "crisis": {
            "description": "Requests fail intermittently.",
            "impact": "Customers retry and support queues grow.",
            "timeline": [
                {"time": "10:00", "event": "Errors begin", "type": "warning"},
                {"time": "10:05", "event": "Pager fires", "type": "critical"}
            ]
        },
        "symptoms": {
            "working": ["Health checks"],
            "broken": ["Writes"]
        },
        "clues": [
            {"id": 1, "title": "Error log", "type": "logs", "content": "timeout after 30s"},
            {"id": 2, "title": "Dashboard", "type": "metrics", "content": "p99 up 10x", "hint": "Look at the pool."}
        ],
        "solution": {
            "diagnosis": "A shared resource is exhausted.",
            "keywords": ["fixture"],
            "rootCause": "Nothing returns the resource.",
            "codeExamples": [
                {"lang": "rust", "description": "Release on drop", "code": "drop(guard);"}
            ],
            "prevention": ["Bound the resource"],
            "educationalInsights": ["Saturation looks like load."]
        }
    })
}

/// [`fixture_case`] with `solution.keywords` replaced.
pub fn fixture_with_keywords(id: &str, category: &str, keywords: &[&str]) -> Value {
    let mut case = fixture_case(id, category, "mid");
    case["solution"]["keywords"] = json!(keywords);
    case
}
