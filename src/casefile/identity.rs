use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Stable slug identifying one case across the whole corpus.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(pub String);

impl CaseId {
    /// Borrow the raw slug.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the id is a non-empty `^[A-Za-z0-9_.-]+$` slug.
    pub fn is_slug(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CaseId {
    fn from(value: &str) -> Self {
        CaseId(value.to_string())
    }
}

/// Closed difficulty ladder. Ordering follows seniority.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Junior,
    Mid,
    Senior,
    Principal,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Junior,
        Difficulty::Mid,
        Difficulty::Senior,
        Difficulty::Principal,
    ];

    /// Lowercase wire name, as authored in case files.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Junior => "junior",
            Difficulty::Mid => "mid",
            Difficulty::Senior => "senior",
            Difficulty::Principal => "principal",
        }
    }

    /// Exact, case-sensitive match on the wire name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.as_str() == value)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic tag for a case.
///
/// The corpus does not define a closed set, so known variants cover the
/// vocabulary authors use today and `Other` keeps unseen tags intact. The
/// loader warns on `Other` values unless they were configured as known.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Category {
    Distributed,
    Database,
    Memory,
    Networking,
    Auth,
    Caching,
    Other(String),
}

impl Category {
    pub const KNOWN: [Category; 6] = [
        Category::Distributed,
        Category::Database,
        Category::Memory,
        Category::Networking,
        Category::Auth,
        Category::Caching,
    ];

    /// Tag as authored; `Other` returns its stored text.
    pub fn as_str(&self) -> &str {
        match self {
            Category::Distributed => "distributed",
            Category::Database => "database",
            Category::Memory => "memory",
            Category::Networking => "networking",
            Category::Auth => "auth",
            Category::Caching => "caching",
            Category::Other(value) => value.as_str(),
        }
    }

    /// False only for `Other` tags.
    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Other(_))
    }

    fn from_str(value: &str) -> Self {
        match value {
            "distributed" => Category::Distributed,
            "database" => Category::Database,
            "memory" => Category::Memory,
            "networking" => Category::Networking,
            "auth" => Category::Auth,
            "caching" => Category::Caching,
            other => Category::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_str(&value))
    }
}

/// Kind of evidence a clue presents.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClueKind {
    Metrics,
    Code,
    Testimony,
    Logs,
    Config,
}

/// Severity marker on a crisis timeline entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineSeverity {
    Normal,
    Warning,
    Critical,
}
