//! Typed representation of one detective case.
//!
//! Field names follow the authored JSON (camelCase) so a case file can be
//! deserialized directly once it has passed the case schema. Records are only
//! built by the loader; everything downstream holds them read-only.

use crate::casefile::identity::{CaseId, Category, ClueKind, Difficulty, TimelineSeverity};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One self-contained incident narrative.
pub struct CaseRecord {
    pub id: CaseId,
    pub title: String,
    pub subtitle: String,
    pub difficulty: Difficulty,
    pub category: Category,
    pub crisis: Crisis,
    pub symptoms: Symptoms,
    pub clues: Vec<Clue>,
    pub solution: Solution,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// What broke and how it unfolded.
pub struct Crisis {
    pub description: String,
    pub impact: String,
    /// Authored order; never re-sorted.
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub time: String,
    pub event: String,
    #[serde(rename = "type")]
    pub severity: TimelineSeverity,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Symptoms {
    #[serde(default)]
    pub working: Vec<String>,
    #[serde(default)]
    pub broken: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// One piece of evidence. `id` is scoped to the owning case.
pub struct Clue {
    pub id: u32,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ClueKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub diagnosis: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub root_cause: String,
    #[serde(default)]
    pub code_examples: Vec<CodeExample>,
    #[serde(default)]
    pub prevention: Vec<String>,
    #[serde(default)]
    pub educational_insights: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CodeExample {
    pub lang: String,
    pub description: String,
    pub code: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// List-view projection of a case without the nested narrative.
pub struct CaseSummary {
    pub id: CaseId,
    pub title: String,
    pub subtitle: String,
    pub difficulty: Difficulty,
    pub category: Category,
}

impl CaseRecord {
    /// Create the compact summary used by list and search views.
    pub fn summary(&self) -> CaseSummary {
        CaseSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            difficulty: self.difficulty,
            category: self.category.clone(),
        }
    }

    /// Look up a clue by its per-case id.
    pub fn clue(&self, id: u32) -> Option<&Clue> {
        self.clues.iter().find(|clue| clue.id == id)
    }

    /// The first `count` clues in presentation order.
    pub fn revealed_clues(&self, count: usize) -> &[Clue] {
        &self.clues[..count.min(self.clues.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> CaseRecord {
        serde_json::from_value(json!({
            "id": "pool-exhaustion",
            "title": "The Vanishing Connections",
            "subtitle": "Checkout hangs every Friday",
            "difficulty": "senior",
            "category": "database",
            "crisis": {
                "description": "Checkout requests time out.",
                "impact": "Revenue loss during peak.",
                "timeline": [
                    {"time": "17:05", "event": "Latency climbs", "type": "warning"},
                    {"time": "17:00", "event": "Deploy finished", "type": "normal"}
                ]
            },
            "symptoms": {"working": ["Health checks"], "broken": ["Checkout"]},
            "clues": [
                {"id": 1, "title": "Pool gauge", "type": "metrics", "content": "active=50/50"},
                {"id": 2, "title": "Handler", "type": "code", "content": "conn = pool.get()", "hint": "Where is it released?"}
            ],
            "solution": {
                "diagnosis": "Connections leak on the error path.",
                "keywords": ["connection pool", "leak"],
                "rootCause": "Early return skips release.",
                "codeExamples": [{"lang": "rust", "description": "Scope the guard", "code": "let conn = pool.get()?;"}],
                "prevention": ["Use RAII guards"],
                "educationalInsights": ["Pools hide leaks until saturation"]
            }
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_authored_field_names() {
        let case = sample();
        assert_eq!(case.solution.root_cause, "Early return skips release.");
        assert_eq!(case.solution.code_examples[0].lang, "rust");
        assert_eq!(case.clues[1].kind, ClueKind::Code);
        assert_eq!(case.clues[0].hint, None);
        // timeline keeps authored order even when it is not chronological
        assert_eq!(case.crisis.timeline[0].time, "17:05");
        assert_eq!(case.crisis.timeline[0].severity, TimelineSeverity::Warning);
    }

    #[test]
    fn serializes_back_to_authored_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.pointer("/solution/rootCause").is_some());
        assert!(value.pointer("/solution/educationalInsights").is_some());
        assert_eq!(value.pointer("/clues/0/type").and_then(|v| v.as_str()), Some("metrics"));
        assert!(value.pointer("/clues/0/hint").is_none());
    }

    #[test]
    fn summary_drops_nested_content() {
        let summary = sample().summary();
        assert_eq!(summary.id.as_str(), "pool-exhaustion");
        assert_eq!(summary.category, Category::Database);
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("clues").is_none());
        assert_eq!(value.get("difficulty").and_then(|v| v.as_str()), Some("senior"));
    }

    #[test]
    fn clue_reveal_saturates() {
        let case = sample();
        assert_eq!(case.revealed_clues(0).len(), 0);
        assert_eq!(case.revealed_clues(1)[0].id, 1);
        assert_eq!(case.revealed_clues(10).len(), 2);
        assert_eq!(case.clue(2).map(|c| c.title.as_str()), Some("Handler"));
        assert!(case.clue(9).is_none());
    }
}
