//! Turns loosely-typed case candidates into validated [`CaseRecord`]s.
//!
//! Each candidate is checked on its own: a malformed entry is recorded as a
//! [`LoadError`] and skipped while the rest of the batch keeps loading. Only
//! problems with the batch itself (for example a top-level document that is
//! not an array) are returned as `Err`.

use crate::casefile::identity::CaseId;
use crate::casefile::model::CaseRecord;
use crate::schema_loader::CaseSchema;
use anyhow::{Result, bail};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// One raw entry handed to the loader.
#[derive(Clone, Debug)]
pub enum RawCandidate {
    /// JSON that parsed; its shape is still unchecked.
    Parsed { origin: Option<String>, value: Value },
    /// Source text that never became JSON (bad file, bad NDJSON line).
    Unparsable { origin: String, reason: String },
}

impl RawCandidate {
    /// A parsed candidate labelled with where it came from.
    pub fn with_origin(value: Value, origin: impl Into<String>) -> Self {
        RawCandidate::Parsed {
            origin: Some(origin.into()),
            value,
        }
    }

    /// File path, array slot or stream line, when known.
    pub fn origin(&self) -> Option<&str> {
        match self {
            RawCandidate::Parsed { origin, .. } => origin.as_deref(),
            RawCandidate::Unparsable { origin, .. } => Some(origin.as_str()),
        }
    }
}

impl From<Value> for RawCandidate {
    fn from(value: Value) -> Self {
        RawCandidate::Parsed {
            origin: None,
            value,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadErrorKind {
    NotAnObject,
    Unparsable,
    Schema,
    Malformed,
    EmptyField,
    InvalidId,
    DuplicateCaseId,
    DuplicateClueId,
}

impl LoadErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadErrorKind::NotAnObject => "not_an_object",
            LoadErrorKind::Unparsable => "unparsable",
            LoadErrorKind::Schema => "schema",
            LoadErrorKind::Malformed => "malformed",
            LoadErrorKind::EmptyField => "empty_field",
            LoadErrorKind::InvalidId => "invalid_id",
            LoadErrorKind::DuplicateCaseId => "duplicate_case_id",
            LoadErrorKind::DuplicateClueId => "duplicate_clue_id",
        }
    }
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected candidate. `index` is the candidate's position in the batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoadError {
    pub index: usize,
    pub id: Option<CaseId>,
    pub origin: Option<String>,
    pub kind: LoadErrorKind,
    pub reason: String,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "candidate #{}", self.index)?;
        if let Some(id) = &self.id {
            write!(f, " ({id})")?;
        }
        if let Some(origin) = &self.origin {
            write!(f, " from {origin}")?;
        }
        write!(f, ": {}: {}", self.kind, self.reason)
    }
}

/// Accepted candidate worth a second look (currently: unknown category).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoadWarning {
    pub index: usize,
    pub id: CaseId,
    pub origin: Option<String>,
    pub message: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "candidate #{} ({})", self.index, self.id)?;
        if let Some(origin) = &self.origin {
            write!(f, " from {origin}")?;
        }
        write!(f, ": {}", self.message)
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoadResult {
    /// Valid records in input order.
    pub records: Vec<CaseRecord>,
    pub errors: Vec<LoadError>,
    pub warnings: Vec<LoadWarning>,
}

impl LoadResult {
    /// Number of candidates the batch contained.
    pub fn candidates(&self) -> usize {
        self.records.len() + self.errors.len()
    }

    /// "N cases loaded, M entries skipped", for operator-facing output.
    pub fn summary_line(&self) -> String {
        format!(
            "{} cases loaded, {} entries skipped",
            self.records.len(),
            self.errors.len()
        )
    }
}

#[derive(Clone, Debug)]
pub struct CaseLoader {
    schema: Arc<CaseSchema>,
    extra_categories: BTreeSet<String>,
}

impl CaseLoader {
    /// A loader validating against `schema`, with only the built-in categories.
    pub fn new(schema: Arc<CaseSchema>) -> Self {
        Self {
            schema,
            extra_categories: BTreeSet::new(),
        }
    }

    /// Loader backed by the embedded case schema.
    pub fn with_embedded_schema() -> Result<Self> {
        Ok(Self::new(CaseSchema::embedded()?))
    }

    /// Treat these category tags as known, suppressing unknown-category warnings.
    pub fn with_extra_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_categories
            .extend(categories.into_iter().map(Into::into));
        self
    }

    /// The compiled schema every candidate is checked against.
    pub fn schema(&self) -> &CaseSchema {
        &self.schema
    }

    /// Validate every candidate, keeping the good ones.
    ///
    /// The first accepted occurrence of an id wins; later candidates with the
    /// same id are rejected as duplicates.
    pub fn load_all<I>(&self, candidates: I) -> LoadResult
    where
        I: IntoIterator,
        I::Item: Into<RawCandidate>,
    {
        let mut result = LoadResult::default();
        let mut seen: BTreeSet<CaseId> = BTreeSet::new();

        for (index, candidate) in candidates.into_iter().map(Into::into).enumerate() {
            let origin = candidate.origin().map(str::to_string);
            match self.validate(index, candidate, &seen) {
                Ok(record) => {
                    if !record.category.is_known()
                        && !self.extra_categories.contains(record.category.as_str())
                    {
                        tracing::warn!(
                            index,
                            id = %record.id,
                            category = %record.category,
                            "case uses a category outside the known vocabulary"
                        );
                        result.warnings.push(LoadWarning {
                            index,
                            id: record.id.clone(),
                            origin,
                            message: format!("unknown category '{}'", record.category),
                        });
                    }
                    seen.insert(record.id.clone());
                    result.records.push(record);
                }
                Err(err) => {
                    tracing::warn!(
                        index,
                        id = err.id.as_ref().map(CaseId::as_str).unwrap_or("-"),
                        kind = %err.kind,
                        reason = %err.reason,
                        "rejected case candidate"
                    );
                    result.errors.push(err);
                }
            }
        }

        tracing::info!(
            loaded = result.records.len(),
            skipped = result.errors.len(),
            warnings = result.warnings.len(),
            "case batch loaded"
        );
        result
    }

    /// Load a whole JSON document that must be an array of candidates.
    pub fn load_document(&self, document: &Value) -> Result<LoadResult> {
        let Some(items) = document.as_array() else {
            bail!(
                "case document must be a JSON array, got {}",
                json_type_name(document)
            );
        };
        Ok(self.load_all(items.iter().cloned()))
    }

    fn validate(
        &self,
        index: usize,
        candidate: RawCandidate,
        seen: &BTreeSet<CaseId>,
    ) -> Result<CaseRecord, LoadError> {
        let (origin, value) = match candidate {
            RawCandidate::Parsed { origin, value } => (origin, value),
            RawCandidate::Unparsable { origin, reason } => {
                return Err(LoadError {
                    index,
                    id: None,
                    origin: Some(origin),
                    kind: LoadErrorKind::Unparsable,
                    reason,
                });
            }
        };
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .map(CaseId::from);
        let reject = |kind: LoadErrorKind, reason: String| LoadError {
            index,
            id: id.clone(),
            origin: origin.clone(),
            kind,
            reason,
        };

        if !value.is_object() {
            return Err(reject(
                LoadErrorKind::NotAnObject,
                format!("expected a JSON object, got {}", json_type_name(&value)),
            ));
        }

        let violations = self.schema.violations(&value);
        if !violations.is_empty() {
            return Err(reject(LoadErrorKind::Schema, violations.join("; ")));
        }

        let record: CaseRecord = serde_json::from_value(value)
            .map_err(|err| reject(LoadErrorKind::Malformed, err.to_string()))?;

        if !record.id.is_slug() {
            return Err(reject(
                LoadErrorKind::InvalidId,
                format!("id '{}' must match ^[A-Za-z0-9_.-]+$", record.id),
            ));
        }
        if let Some(field) = first_blank_field(&record) {
            return Err(reject(
                LoadErrorKind::EmptyField,
                format!("{field} must not be blank"),
            ));
        }
        if let Some(clue_id) = first_duplicate_clue(&record) {
            return Err(reject(
                LoadErrorKind::DuplicateClueId,
                format!("clue id {clue_id} appears more than once"),
            ));
        }
        if seen.contains(&record.id) {
            return Err(reject(
                LoadErrorKind::DuplicateCaseId,
                format!("duplicate case id '{}'; the first occurrence is kept", record.id),
            ));
        }
        Ok(record)
    }
}

fn first_blank_field(record: &CaseRecord) -> Option<String> {
    let required = [
        ("title", record.title.as_str()),
        ("subtitle", record.subtitle.as_str()),
        ("category", record.category.as_str()),
        ("crisis.description", record.crisis.description.as_str()),
        ("crisis.impact", record.crisis.impact.as_str()),
        ("solution.diagnosis", record.solution.diagnosis.as_str()),
        ("solution.rootCause", record.solution.root_cause.as_str()),
    ];
    if let Some((field, _)) = required.iter().find(|(_, text)| text.trim().is_empty()) {
        return Some((*field).to_string());
    }
    if let Some(pos) = record
        .crisis
        .timeline
        .iter()
        .position(|entry| entry.event.trim().is_empty())
    {
        return Some(format!("crisis.timeline[{pos}].event"));
    }
    record
        .clues
        .iter()
        .position(|clue| clue.title.trim().is_empty())
        .map(|pos| format!("clues[{pos}].title"))
}

fn first_duplicate_clue(record: &CaseRecord) -> Option<u32> {
    let mut ids = BTreeSet::new();
    record
        .clues
        .iter()
        .map(|clue| clue.id)
        .find(|id| !ids.insert(*id))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
