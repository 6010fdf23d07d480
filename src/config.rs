//! Environment-driven settings for binaries and embedders.
//!
//! Every knob is an environment variable; `Settings::from_lookup` takes the
//! lookup as a function so tests can feed values without touching the
//! process environment.

use crate::casefile::CaseLoader;
use crate::schema_loader::CaseSchema;
use crate::{find_repo_root_from, split_list};
use anyhow::{Result, bail};
use std::env;
use std::path::PathBuf;

pub const ENV_ROOT: &str = "CASEBOOK_ROOT";
pub const ENV_CORPUS: &str = "CASEBOOK_CORPUS";
pub const ENV_CASE_SCHEMA: &str = "CASEBOOK_CASE_SCHEMA";
pub const ENV_EXTRA_CATEGORIES: &str = "CASEBOOK_EXTRA_CATEGORIES";
pub const ENV_LOG_FORMAT: &str = "CASEBOOK_LOG_FORMAT";

/// Directory under the repository root holding the authored cases.
pub const CORPUS_DIR: &str = "corpus";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "" | "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => bail!("unknown log format '{other}' (expected compact|json)"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Settings {
    /// Value of `CASEBOOK_ROOT`, if set.
    pub root_hint: Option<String>,
    pub corpus_dir: Option<PathBuf>,
    pub schema_path: Option<PathBuf>,
    pub extra_categories: Vec<String>,
    pub log_format: LogFormat,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Ok(Self {
            root_hint: non_empty(ENV_ROOT),
            corpus_dir: non_empty(ENV_CORPUS).map(PathBuf::from),
            schema_path: non_empty(ENV_CASE_SCHEMA).map(PathBuf::from),
            extra_categories: non_empty(ENV_EXTRA_CATEGORIES)
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            log_format: match non_empty(ENV_LOG_FORMAT) {
                Some(raw) => LogFormat::parse(&raw)?,
                None => LogFormat::default(),
            },
        })
    }

    /// The corpus directory: the explicit override, else `<repo root>/corpus`.
    pub fn resolve_corpus_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.corpus_dir {
            return Ok(dir.clone());
        }
        let root = find_repo_root_from(self.root_hint.as_deref())?;
        Ok(root.join(CORPUS_DIR))
    }

    /// A loader using the configured schema and category vocabulary.
    pub fn loader(&self) -> Result<CaseLoader> {
        let schema = CaseSchema::resolve(self.schema_path.as_deref())?;
        Ok(CaseLoader::new(schema).with_extra_categories(self.extra_categories.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert!(settings.corpus_dir.is_none());
        assert!(settings.schema_path.is_none());
        assert!(settings.extra_categories.is_empty());
        assert_eq!(settings.log_format, LogFormat::Compact);
    }

    #[test]
    fn reads_every_knob() {
        let settings = Settings::from_lookup(lookup(&[
            (ENV_CORPUS, "/srv/cases"),
            (ENV_CASE_SCHEMA, "/srv/schema.json"),
            (ENV_EXTRA_CATEGORIES, "observability, security  queues"),
            (ENV_LOG_FORMAT, "json"),
            (ENV_ROOT, "  "),
        ]))
        .unwrap();
        assert_eq!(settings.corpus_dir, Some(PathBuf::from("/srv/cases")));
        assert_eq!(settings.schema_path, Some(PathBuf::from("/srv/schema.json")));
        assert_eq!(settings.extra_categories, ["observability", "security", "queues"]);
        assert_eq!(settings.log_format, LogFormat::Json);
        assert!(settings.root_hint.is_none());
        assert_eq!(settings.resolve_corpus_dir().unwrap(), PathBuf::from("/srv/cases"));
    }

    #[test]
    fn rejects_unknown_log_format() {
        let err = Settings::from_lookup(lookup(&[(ENV_LOG_FORMAT, "xml")])).unwrap_err();
        assert!(err.to_string().contains("unknown log format"));
    }

    #[test]
    fn configured_categories_reach_the_loader() {
        let settings = Settings::from_lookup(lookup(&[(ENV_EXTRA_CATEGORIES, "queues")])).unwrap();
        let loader = settings.loader().unwrap();
        let result = loader.load_all(vec![serde_json::json!({
            "id": "q",
            "title": "t",
            "subtitle": "s",
            "difficulty": "junior",
            "category": "queues",
            "crisis": {"description": "d", "impact": "i", "timeline": []},
            "symptoms": {"working": [], "broken": []},
            "clues": [],
            "solution": {
                "diagnosis": "d", "keywords": [], "rootCause": "r",
                "codeExamples": [], "prevention": [], "educationalInsights": []
            }
        })]);
        assert_eq!(result.records.len(), 1);
        assert!(result.warnings.is_empty());
    }
}
