//! Public facade over the loader and index.
//!
//! A repository moves through `Uninitialized -> Ready | FailedInit`, and
//! `reload` moves between `Ready` and `FailedInit`. Each successful load is
//! published as an immutable [`CaseSnapshot`]: the new snapshot is built in
//! full before the write lock is taken, and publishing is a single `Arc`
//! assignment. Callers that hold a snapshot keep reading that generation no
//! matter how many reloads happen afterwards.

use crate::casefile::identity::{CaseId, Category, Difficulty};
use crate::casefile::index::{CaseIndex, IndexStats};
use crate::casefile::loader::{CaseLoader, LoadError, LoadResult, LoadWarning, RawCandidate};
use crate::casefile::model::{CaseRecord, CaseSummary};
use crate::error::{InitializationError, NotFoundError, RepositoryError};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Optional list filters; both must match when both are set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaseFilter {
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
}

impl CaseFilter {
    /// Restrict to one category tag.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Restrict to one difficulty.
    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    fn matches(&self, record: &CaseRecord) -> bool {
        self.category
            .as_deref()
            .is_none_or(|category| record.category.as_str() == category)
            && self
                .difficulty
                .is_none_or(|difficulty| record.difficulty == difficulty)
    }
}

/// One published generation of the corpus.
#[derive(Debug)]
pub struct CaseSnapshot {
    generation: u64,
    candidates: usize,
    index: CaseIndex,
    errors: Vec<LoadError>,
    warnings: Vec<LoadWarning>,
}

impl CaseSnapshot {
    /// Build everything except the generation, which is assigned at publish.
    fn from_load(load: LoadResult) -> Self {
        let candidates = load.candidates();
        Self {
            generation: 0,
            candidates,
            index: CaseIndex::build(load.records),
            errors: load.errors,
            warnings: load.warnings,
        }
    }

    /// Publish sequence number, starting at 1.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The read-side projection this snapshot answers from.
    pub fn index(&self) -> &CaseIndex {
        &self.index
    }

    /// Candidates rejected while loading this generation.
    pub fn errors(&self) -> &[LoadError] {
        &self.errors
    }

    /// Accepted candidates that were flagged, such as unknown categories.
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Size of the batch this snapshot was loaded from.
    pub fn candidates(&self) -> usize {
        self.candidates
    }

    /// "N cases loaded, M entries skipped" for this generation.
    pub fn summary_line(&self) -> String {
        format!(
            "{} cases loaded, {} entries skipped",
            self.index.len(),
            self.errors.len()
        )
    }

    /// Full record for `id` in this generation.
    pub fn get_case(&self, id: &str) -> Result<Arc<CaseRecord>, NotFoundError> {
        let id = CaseId::from(id);
        match self.index.get_by_id(&id) {
            Some(record) => Ok(Arc::clone(record)),
            None => Err(NotFoundError { id }),
        }
    }

    /// Summaries in corpus order.
    pub fn list_cases(&self, filter: &CaseFilter) -> Vec<CaseSummary> {
        let candidates = match (&filter.category, filter.difficulty) {
            (Some(category), _) => self.index.list_by_category(category),
            (None, Some(difficulty)) => self.index.list_by_difficulty(difficulty),
            (None, None) => self.index.records(),
        };
        candidates
            .iter()
            .filter(|record| filter.matches(record))
            .map(|record| record.summary())
            .collect()
    }

    /// Summaries ordered by id.
    pub fn search_cases(&self, term: &str) -> Vec<CaseSummary> {
        self.index
            .search(term)
            .iter()
            .map(|record| record.summary())
            .collect()
    }

    /// Category tags present, sorted.
    pub fn categories(&self) -> Vec<Category> {
        self.index.categories().collect()
    }

    /// Counts per category and difficulty.
    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }
}

#[derive(Debug)]
enum RepositoryState {
    Uninitialized,
    Ready(Arc<CaseSnapshot>),
    FailedInit(InitializationError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryPhase {
    Uninitialized,
    Ready,
    FailedInit,
}

/// Point-in-time view of the repository state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RepositoryStatus {
    pub phase: RepositoryPhase,
    pub generation: u64,
    pub cases: usize,
}

#[derive(Debug)]
pub struct CaseRepository {
    loader: CaseLoader,
    state: RwLock<RepositoryState>,
    /// Generation of the most recent successful publish. Only written while
    /// the state write lock is held.
    last_generation: AtomicU64,
}

impl CaseRepository {
    /// An uninitialized repository that will validate with `loader`.
    pub fn new(loader: CaseLoader) -> Self {
        Self {
            loader,
            state: RwLock::new(RepositoryState::Uninitialized),
            last_generation: AtomicU64::new(0),
        }
    }

    /// The loader every initialize and reload goes through.
    pub fn loader(&self) -> &CaseLoader {
        &self.loader
    }

    /// First load. Fails closed when no candidate survives validation.
    pub fn initialize<I>(&self, candidates: I) -> Result<Arc<CaseSnapshot>, RepositoryError>
    where
        I: IntoIterator,
        I::Item: Into<RawCandidate>,
    {
        if !matches!(*self.read_state(), RepositoryState::Uninitialized) {
            return Err(RepositoryError::AlreadyInitialized);
        }
        self.publish(candidates, |state| {
            matches!(state, RepositoryState::Uninitialized)
        })
    }

    /// Replace the whole corpus. Readers holding an older snapshot are unaffected.
    pub fn reload<I>(&self, candidates: I) -> Result<Arc<CaseSnapshot>, RepositoryError>
    where
        I: IntoIterator,
        I::Item: Into<RawCandidate>,
    {
        if matches!(*self.read_state(), RepositoryState::Uninitialized) {
            return Err(RepositoryError::NotReady);
        }
        self.publish(candidates, |state| {
            !matches!(state, RepositoryState::Uninitialized)
        })
    }

    /// The current snapshot, for callers that issue several related queries.
    pub fn snapshot(&self) -> Result<Arc<CaseSnapshot>, RepositoryError> {
        match &*self.read_state() {
            RepositoryState::Uninitialized => Err(RepositoryError::NotReady),
            RepositoryState::Ready(snapshot) => Ok(Arc::clone(snapshot)),
            RepositoryState::FailedInit(err) => Err(RepositoryError::Initialization(err.clone())),
        }
    }

    /// Current phase, plus the generation and case count being served.
    ///
    /// In `FailedInit` the generation is the last one ever published (0 when
    /// no load has succeeded yet) and the case count is 0.
    pub fn status(&self) -> RepositoryStatus {
        let state = self.read_state();
        match &*state {
            RepositoryState::Uninitialized => RepositoryStatus {
                phase: RepositoryPhase::Uninitialized,
                generation: 0,
                cases: 0,
            },
            RepositoryState::Ready(snapshot) => RepositoryStatus {
                phase: RepositoryPhase::Ready,
                generation: snapshot.generation(),
                cases: snapshot.index().len(),
            },
            RepositoryState::FailedInit(_) => RepositoryStatus {
                phase: RepositoryPhase::FailedInit,
                generation: self.last_generation.load(Ordering::SeqCst),
                cases: 0,
            },
        }
    }

    /// [`CaseSnapshot::get_case`] on the current snapshot.
    pub fn get_case(&self, id: &str) -> Result<Arc<CaseRecord>, RepositoryError> {
        Ok(self.snapshot()?.get_case(id)?)
    }

    /// [`CaseSnapshot::list_cases`] on the current snapshot.
    pub fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseSummary>, RepositoryError> {
        Ok(self.snapshot()?.list_cases(filter))
    }

    /// [`CaseSnapshot::search_cases`] on the current snapshot.
    pub fn search_cases(&self, term: &str) -> Result<Vec<CaseSummary>, RepositoryError> {
        Ok(self.snapshot()?.search_cases(term))
    }

    fn publish<I>(
        &self,
        candidates: I,
        allowed: impl Fn(&RepositoryState) -> bool,
    ) -> Result<Arc<CaseSnapshot>, RepositoryError>
    where
        I: IntoIterator,
        I::Item: Into<RawCandidate>,
    {
        let load = self.loader.load_all(candidates);
        let outcome = if load.records.is_empty() {
            Err(InitializationError {
                candidates: load.candidates(),
                diagnostics: load.errors,
            })
        } else {
            Ok(load)
        };

        // The index is built outside the lock. The generation is assigned
        // under it.
        let built = outcome.map(CaseSnapshot::from_load);

        let mut state = self.write_state();
        if !allowed(&state) {
            return Err(match &*state {
                RepositoryState::Uninitialized => RepositoryError::NotReady,
                _ => RepositoryError::AlreadyInitialized,
            });
        }
        match built {
            Ok(mut snapshot) => {
                snapshot.generation = self.last_generation.load(Ordering::SeqCst) + 1;
                self.last_generation
                    .store(snapshot.generation, Ordering::SeqCst);
                let snapshot = Arc::new(snapshot);
                tracing::info!(
                    generation = snapshot.generation(),
                    cases = snapshot.index().len(),
                    skipped = snapshot.errors().len(),
                    "published case snapshot"
                );
                *state = RepositoryState::Ready(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(err) => {
                tracing::error!(
                    candidates = err.candidates,
                    rejected = err.diagnostics.len(),
                    "case load produced no valid records"
                );
                *state = RepositoryState::FailedInit(err.clone());
                Err(RepositoryError::Initialization(err))
            }
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RepositoryState> {
        self.state.read().unwrap_or_else(|err| err.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RepositoryState> {
        self.state.write().unwrap_or_else(|err| err.into_inner())
    }
}
