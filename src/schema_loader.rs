//! Detective-case JSON Schema loading.
//!
//! The canonical schema ships inside the binary so loaders work without a
//! checkout; `CASEBOOK_CASE_SCHEMA` (or an explicit path) swaps in an on-disk
//! copy. Either way the document is compiled once and reused for every
//! candidate.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Repository-relative location of the canonical case schema.
pub const CANONICAL_CASE_SCHEMA_PATH: &str = "schema/detective_case.schema.json";

const EMBEDDED_CASE_SCHEMA: &str = include_str!("../schema/detective_case.schema.json");

/// Where a compiled schema came from, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaOrigin {
    Embedded,
    File(PathBuf),
}

impl fmt::Display for SchemaOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaOrigin::Embedded => f.write_str("embedded case schema"),
            SchemaOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Compiled case schema plus the raw document it was built from.
pub struct CaseSchema {
    compiled: JSONSchema,
    raw: Arc<Value>,
    origin: SchemaOrigin,
}

impl fmt::Debug for CaseSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseSchema")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl CaseSchema {
    /// Process-wide copy of the embedded schema, compiled on first use.
    pub fn embedded() -> Result<Arc<CaseSchema>> {
        static EMBEDDED: OnceLock<Result<Arc<CaseSchema>, String>> = OnceLock::new();
        EMBEDDED
            .get_or_init(|| {
                serde_json::from_str::<Value>(EMBEDDED_CASE_SCHEMA)
                    .map_err(|err| format!("parsing embedded case schema: {err}"))
                    .and_then(|value| {
                        CaseSchema::compile(value, SchemaOrigin::Embedded)
                            .map(Arc::new)
                            .map_err(|err| format!("{err:#}"))
                    })
            })
            .clone()
            .map_err(|err| anyhow!(err))
    }

    /// Read and compile a schema file.
    pub fn from_path(path: &Path) -> Result<CaseSchema> {
        let file = File::open(path).with_context(|| format!("opening schema {}", path.display()))?;
        let value: Value = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing schema {}", path.display()))?;
        CaseSchema::compile(value, SchemaOrigin::File(path.to_path_buf()))
    }

    /// Use the file at `path` when given, otherwise the embedded schema.
    pub fn resolve(path: Option<&Path>) -> Result<Arc<CaseSchema>> {
        match path {
            Some(path) => CaseSchema::from_path(path).map(Arc::new),
            None => CaseSchema::embedded(),
        }
    }

    fn compile(value: Value, origin: SchemaOrigin) -> Result<CaseSchema> {
        if !value.is_object() {
            bail!("{origin} is not a JSON object");
        }
        let compiled = JSONSchema::compile(&value)
            .map_err(|err| anyhow!("compiling {origin}: {err}"))?;
        Ok(CaseSchema {
            compiled,
            raw: Arc::new(value),
            origin,
        })
    }

    /// Every schema violation for `instance`, in validator order.
    ///
    /// An empty vector means the instance conforms.
    pub fn violations(&self, instance: &Value) -> Vec<String> {
        match self.compiled.validate(instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|err| {
                    let path = err.instance_path.to_string();
                    if path.is_empty() {
                        err.to_string()
                    } else {
                        format!("{path}: {err}")
                    }
                })
                .collect(),
        }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn origin(&self) -> &SchemaOrigin {
        &self.origin
    }
}
