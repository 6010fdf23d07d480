//! Read-side projection over a validated set of cases.
//!
//! The index never mutates the records it is given: every structure holds an
//! `Arc` to the same immutable record. Category and difficulty listings keep
//! corpus order; id-keyed structures use `BTreeMap`/`BTreeSet` so iteration
//! order never depends on hashing.
//!
//! Keyword search is exact-token. Text is lower-cased and split into maximal
//! runs of alphanumeric characters. `solution.keywords` entries contribute
//! their whole trimmed phrase and each token; `title` and `subtitle` contribute
//! tokens except a few stop words. A query term is normalized the same way and
//! matches on its whole phrase or on any of its tokens.

use crate::casefile::identity::{CaseId, Category, Difficulty};
use crate::casefile::model::CaseRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "at", "by", "for", "in", "is", "of", "on", "or", "the", "to", "with",
];

#[derive(Debug, Default)]
pub struct CaseIndex {
    records: Vec<Arc<CaseRecord>>,
    by_id: BTreeMap<CaseId, Arc<CaseRecord>>,
    by_category: BTreeMap<String, Vec<Arc<CaseRecord>>>,
    by_difficulty: BTreeMap<Difficulty, Vec<Arc<CaseRecord>>>,
    keywords: BTreeMap<String, BTreeSet<CaseId>>,
}

/// Per-category and per-difficulty counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_difficulty: BTreeMap<Difficulty, usize>,
}

impl CaseIndex {
    /// Build the projection. Records must already have unique ids; a repeated
    /// id keeps the first record in the id map.
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<CaseRecord>>,
    {
        let mut index = CaseIndex::default();
        for record in records {
            let record: Arc<CaseRecord> = record.into();
            if index.by_id.contains_key(&record.id) {
                continue;
            }
            index.by_id.insert(record.id.clone(), Arc::clone(&record));
            index
                .by_category
                .entry(record.category.as_str().to_string())
                .or_default()
                .push(Arc::clone(&record));
            index
                .by_difficulty
                .entry(record.difficulty)
                .or_default()
                .push(Arc::clone(&record));
            for token in record_terms(&record) {
                index
                    .keywords
                    .entry(token)
                    .or_default()
                    .insert(record.id.clone());
            }
            index.records.push(record);
        }
        tracing::debug!(
            cases = index.records.len(),
            categories = index.by_category.len(),
            terms = index.keywords.len(),
            "built case index"
        );
        index
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in corpus order.
    pub fn records(&self) -> &[Arc<CaseRecord>] {
        &self.records
    }

    /// Exact id lookup.
    pub fn get_by_id(&self, id: &CaseId) -> Option<&Arc<CaseRecord>> {
        self.by_id.get(id)
    }

    /// Records tagged `category`, in corpus order. Unknown tags yield nothing.
    pub fn list_by_category(&self, category: &str) -> &[Arc<CaseRecord>] {
        self.by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Records at `difficulty`, in corpus order.
    pub fn list_by_difficulty(&self, difficulty: Difficulty) -> &[Arc<CaseRecord>] {
        self.by_difficulty
            .get(&difficulty)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ids matching `term`, ordered by id.
    pub fn search_ids(&self, term: &str) -> BTreeSet<CaseId> {
        let mut hits = BTreeSet::new();
        for key in query_terms(term) {
            if let Some(ids) = self.keywords.get(&key) {
                hits.extend(ids.iter().cloned());
            }
        }
        hits
    }

    /// Records matching `term`, ordered by id.
    pub fn search(&self, term: &str) -> Vec<Arc<CaseRecord>> {
        self.search_ids(term)
            .iter()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect()
    }

    /// Category tags present in the index, sorted.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.by_category
            .values()
            .filter_map(|records| records.first())
            .map(|record| record.category.clone())
    }

    /// Record counts per category tag and per difficulty.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total: self.records.len(),
            by_category: self
                .by_category
                .iter()
                .map(|(category, records)| (category.clone(), records.len()))
                .collect(),
            by_difficulty: self
                .by_difficulty
                .iter()
                .map(|(difficulty, records)| (*difficulty, records.len()))
                .collect(),
        }
    }
}

/// Lower-case alphanumeric runs of `text`.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

fn normalize_phrase(text: &str) -> Option<String> {
    let phrase = text.trim().to_lowercase();
    (!phrase.is_empty()).then_some(phrase)
}

fn record_terms(record: &CaseRecord) -> BTreeSet<String> {
    let mut terms = BTreeSet::new();
    for keyword in &record.solution.keywords {
        terms.extend(normalize_phrase(keyword));
        terms.extend(tokenize(keyword));
    }
    for text in [&record.title, &record.subtitle] {
        terms.extend(tokenize(text).filter(|token| !is_stop_word(token)));
    }
    terms
}

fn query_terms(term: &str) -> BTreeSet<String> {
    let mut terms: BTreeSet<String> = normalize_phrase(term).into_iter().collect();
    terms.extend(tokenize(term).filter(|token| !is_stop_word(token)));
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casefile::model::{Crisis, Solution, Symptoms};

    fn record(id: &str, category: &str, difficulty: Difficulty, keywords: &[&str]) -> CaseRecord {
        CaseRecord {
            id: CaseId::from(id),
            title: format!("Incident {id}"),
            subtitle: "A night in the on-call rotation".to_string(),
            difficulty,
            category: serde_json::from_value(serde_json::json!(category)).unwrap(),
            crisis: Crisis {
                description: "d".into(),
                impact: "i".into(),
                timeline: Vec::new(),
            },
            symptoms: Symptoms {
                working: Vec::new(),
                broken: Vec::new(),
            },
            clues: Vec::new(),
            solution: Solution {
                diagnosis: "d".into(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
                root_cause: "r".into(),
                code_examples: Vec::new(),
                prevention: Vec::new(),
                educational_insights: Vec::new(),
            },
        }
    }

    fn ids(records: &[Arc<CaseRecord>]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn tokenize_splits_on_punctuation_and_lowercases() {
        let tokens: Vec<String> = tokenize("N+1 Queries: Cache-Stampede!").collect();
        assert_eq!(tokens, ["n", "1", "queries", "cache", "stampede"]);
    }

    #[test]
    fn category_and_difficulty_lists_keep_input_order() {
        let index = CaseIndex::build(vec![
            record("z", "database", Difficulty::Mid, &[]),
            record("b", "memory", Difficulty::Mid, &[]),
            record("a", "database", Difficulty::Senior, &[]),
        ]);
        assert_eq!(ids(index.list_by_category("database")), ["z", "a"]);
        assert_eq!(ids(index.list_by_difficulty(Difficulty::Mid)), ["z", "b"]);
        assert!(index.list_by_category("auth").is_empty());
        assert!(index.list_by_difficulty(Difficulty::Principal).is_empty());
        assert_eq!(ids(index.records()), ["z", "b", "a"]);
    }

    #[test]
    fn search_matches_phrases_and_tokens_case_insensitively() {
        let index = CaseIndex::build(vec![
            record("pool", "database", Difficulty::Mid, &["Connection Pool", "leak"]),
            record("lock", "database", Difficulty::Senior, &["deadlock"]),
        ]);
        assert_eq!(ids(&index.search("CONNECTION POOL")), ["pool"]);
        assert_eq!(ids(&index.search("pool")), ["pool"]);
        assert_eq!(ids(&index.search("Deadlock")), ["lock"]);
        // exact tokens only: no substring matches
        assert!(index.search("dead").is_empty());
        // union across tokens, ordered by id
        assert_eq!(ids(&index.search("leak deadlock")), ["lock", "pool"]);
    }

    #[test]
    fn titles_are_searchable_but_stop_words_are_not() {
        let index = CaseIndex::build(vec![record("a", "memory", Difficulty::Junior, &[])]);
        assert_eq!(ids(&index.search("rotation")), ["a"]);
        assert_eq!(ids(&index.search("incident")), ["a"]);
        assert!(index.search("the").is_empty());
        assert!(index.search("   ").is_empty());
    }

    #[test]
    fn stats_and_categories_are_sorted() {
        let index = CaseIndex::build(vec![
            record("a", "networking", Difficulty::Mid, &[]),
            record("b", "auth", Difficulty::Mid, &[]),
            record("c", "auth", Difficulty::Principal, &[]),
        ]);
        let stats = index.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_category.get("auth"), Some(&2));
        assert_eq!(stats.by_difficulty.get(&Difficulty::Mid), Some(&2));
        let categories: Vec<Category> = index.categories().collect();
        assert_eq!(categories, [Category::Auth, Category::Networking]);
    }

    #[test]
    fn repeated_builds_answer_identically() {
        let input = || {
            vec![
                record("c", "caching", Difficulty::Mid, &["ttl"]),
                record("a", "caching", Difficulty::Mid, &["ttl", "stampede"]),
            ]
        };
        let first = CaseIndex::build(input());
        let second = CaseIndex::build(input());
        assert_eq!(
            ids(first.list_by_category("caching")),
            ids(second.list_by_category("caching"))
        );
        assert_eq!(ids(&first.search("ttl")), ids(&second.search("ttl")));
        assert_eq!(ids(&first.search("ttl")), ["a", "c"]);
    }
}
