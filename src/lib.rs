//! Shared library for the casebook detective-case repository.
//!
//! The crate loads authored incident cases, validates them one by one,
//! indexes the survivors and serves them from immutable snapshots. The
//! `casebook` binary is a thin wrapper; everything it does is available here:
//! repository discovery, corpus reading, the case loader/index/repository and
//! logging setup.

use anyhow::{Result, bail};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub mod casefile;
pub mod config;
pub mod corpus;
pub mod error;
pub mod schema_loader;
pub mod telemetry;

pub use casefile::{
    CaseFilter, CaseId, CaseIndex, CaseLoader, CaseRecord, CaseRepository, CaseSnapshot,
    CaseSummary, Category, Clue, ClueKind, CodeExample, Crisis, Difficulty, IndexStats,
    LoadError, LoadErrorKind, LoadResult, LoadWarning, RawCandidate, RepositoryPhase,
    RepositoryStatus, Solution, Symptoms, TimelineEntry, TimelineSeverity,
};
pub use config::{LogFormat, Settings};
pub use corpus::{collect_case_files, parse_case_stream, read_corpus_dir};
pub use error::{InitializationError, NotFoundError, RepositoryError};
pub use schema_loader::{CANONICAL_CASE_SCHEMA_PATH, CaseSchema, SchemaOrigin};

const CORPUS_SENTINEL: &str = "corpus";

/// Returns true when `candidate` looks like the repository root: it must
/// carry both the canonical case schema and the corpus directory.
fn is_repo_root(candidate: &Path) -> bool {
    candidate.join(CANONICAL_CASE_SCHEMA_PATH).is_file()
        && candidate.join(CORPUS_SENTINEL).is_dir()
}

fn repo_root_from_hint(hint: &str) -> Option<PathBuf> {
    if hint.is_empty() {
        return None;
    }
    let hint_path = PathBuf::from(hint);
    if !hint_path.exists() || !is_repo_root(&hint_path) {
        return None;
    }
    fs::canonicalize(hint_path).ok()
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if is_repo_root(&dir) {
            return Some(dir);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the repository root.
///
/// Search order: the explicit `hint` (normally `CASEBOOK_ROOT`) if it points
/// at a real root, then directories above the current executable, then the
/// build-time `CASEBOOK_ROOT_HINT`.
pub fn find_repo_root_from(hint: Option<&str>) -> Result<PathBuf> {
    if let Some(root) = hint.and_then(repo_root_from_hint) {
        return Ok(root);
    }

    if let Ok(exe_path) = env::current_exe() {
        if let Some(root) = exe_path.parent().and_then(search_upwards) {
            return Ok(root);
        }
    }

    if let Some(root) = option_env!("CASEBOOK_ROOT_HINT").and_then(repo_root_from_hint) {
        return Ok(root);
    }

    bail!(
        "Unable to locate the casebook repository root. Set CASEBOOK_ROOT to a checkout or CASEBOOK_CORPUS to a corpus directory."
    );
}

/// [`find_repo_root_from`] using `CASEBOOK_ROOT` from the environment.
pub fn find_repo_root() -> Result<PathBuf> {
    let hint = env::var(config::ENV_ROOT).ok();
    find_repo_root_from(hint.as_deref())
}

/// Split comma- or whitespace-delimited configuration lists into tokens.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
