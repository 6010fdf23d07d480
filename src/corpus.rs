//! Materializes raw case candidates from disk or a text stream.
//!
//! Nothing here validates case shape; that is the loader's job. A file or
//! line that is not JSON at all still becomes a candidate (marked
//! unparsable) so it shows up in load diagnostics instead of aborting the
//! whole corpus. Only a missing corpus directory or empty input is fatal.

use crate::casefile::RawCandidate;
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Every `*.json` file under `root`, recursively, sorted by path. Symlinked
/// directories below `root` are skipped.
pub fn collect_case_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("corpus directory not found: {}", root.display());
    }
    let mut files = Vec::new();
    collect_json(root, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_json(dir: &Path, acc: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        // Symlinked directories are not followed; `loop -> .` would recurse.
        if entry.file_type()?.is_symlink() && path.is_dir() {
            tracing::debug!(path = %path.display(), "skipping symlinked directory");
            continue;
        }
        if path.is_dir() {
            collect_json(&path, acc)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            acc.push(path);
        }
    }
    Ok(())
}

/// Read a corpus directory into candidates.
///
/// A file holding an object is one candidate; a file holding an array is one
/// candidate per element. Origins are paths relative to `root`, with
/// `#<n>` appended for array elements.
pub fn read_corpus_dir(root: &Path) -> Result<Vec<RawCandidate>> {
    let mut candidates = Vec::new();
    for path in collect_case_files(root)? {
        let label = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .display()
            .to_string();
        let parsed = fs::read_to_string(&path)
            .map_err(|err| format!("unable to read: {err}"))
            .and_then(|text| {
                serde_json::from_str::<Value>(&text).map_err(|err| format!("invalid JSON: {err}"))
            });
        match parsed {
            Ok(Value::Array(items)) => {
                candidates.extend(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(pos, value)| RawCandidate::with_origin(value, format!("{label}#{pos}"))),
                );
            }
            Ok(value) => candidates.push(RawCandidate::with_origin(value, label)),
            Err(reason) => candidates.push(RawCandidate::Unparsable {
                origin: label,
                reason,
            }),
        }
    }
    tracing::debug!(
        root = %root.display(),
        candidates = candidates.len(),
        "read case corpus"
    );
    Ok(candidates)
}

/// Parse cases from text: a JSON array, a single JSON object, or NDJSON.
///
/// NDJSON lines that do not parse become unparsable candidates labelled
/// `line <n>`; blank lines are skipped. Empty input is an error.
pub fn parse_case_stream(input: &str) -> Result<Vec<RawCandidate>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        bail!("no case input provided");
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(match value {
            Value::Array(items) => items.into_iter().map(RawCandidate::from).collect(),
            other => vec![RawCandidate::from(other)],
        });
    }

    let mut candidates = Vec::new();
    for (idx, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let origin = format!("line {}", idx + 1);
        candidates.push(match serde_json::from_str::<Value>(line) {
            Ok(value) => RawCandidate::with_origin(value, origin),
            Err(err) => RawCandidate::Unparsable {
                origin,
                reason: format!("invalid JSON: {err}"),
            },
        });
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn origins(candidates: &[RawCandidate]) -> Vec<String> {
        candidates
            .iter()
            .map(|c| c.origin().unwrap_or("-").to_string())
            .collect()
    }

    #[test]
    fn reads_nested_files_in_path_order() -> Result<()> {
        let dir = TempDir::new()?;
        fs::create_dir(dir.path().join("memory"))?;
        fs::write(dir.path().join("b.json"), json!({"id": "b"}).to_string())?;
        fs::write(
            dir.path().join("memory").join("a.json"),
            json!([{"id": "m1"}, {"id": "m2"}]).to_string(),
        )?;
        fs::write(dir.path().join("notes.txt"), "ignored")?;
        fs::write(dir.path().join("broken.json"), "{ nope")?;

        let candidates = read_corpus_dir(dir.path())?;
        assert_eq!(
            origins(&candidates),
            ["b.json", "broken.json", "memory/a.json#0", "memory/a.json#1"]
        );
        assert!(matches!(candidates[1], RawCandidate::Unparsable { .. }));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() -> Result<()> {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new()?;
        fs::create_dir(dir.path().join("auth"))?;
        fs::write(dir.path().join("auth").join("a.json"), json!({"id": "a"}).to_string())?;
        symlink(dir.path(), dir.path().join("loop"))?;
        symlink(dir.path().join("auth"), dir.path().join("auth-again"))?;

        let files = collect_case_files(dir.path())?;
        assert_eq!(files, [dir.path().join("auth").join("a.json")]);
        assert_eq!(origins(&read_corpus_dir(dir.path())?), ["auth/a.json"]);
        Ok(())
    }

    #[test]
    fn missing_corpus_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = read_corpus_dir(&dir.path().join("absent")).unwrap_err();
        assert!(err.to_string().contains("corpus directory not found"));
    }

    #[test]
    fn stream_accepts_array_object_and_ndjson() -> Result<()> {
        assert_eq!(parse_case_stream(r#"[{"id":"a"},{"id":"b"}]"#)?.len(), 2);
        assert_eq!(parse_case_stream(r#"{"id":"a"}"#)?.len(), 1);

        let ndjson = "{\"id\":\"a\"}\n\n{oops\n{\"id\":\"c\"}\n";
        let candidates = parse_case_stream(ndjson)?;
        assert_eq!(origins(&candidates), ["line 1", "line 3", "line 4"]);
        assert!(matches!(candidates[1], RawCandidate::Unparsable { .. }));
        Ok(())
    }

    #[test]
    fn empty_stream_is_an_error() {
        assert!(parse_case_stream("  \n ").is_err());
    }
}
