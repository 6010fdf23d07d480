//! Detective case model, loader, index and repository.
//!
//! Cases arrive as loosely-typed JSON, pass through `CaseLoader` (schema plus
//! semantic checks), get projected by `CaseIndex`, and are served from
//! immutable snapshots by `CaseRepository`.

pub mod identity;
pub mod index;
pub mod loader;
pub mod model;
pub mod repository;

pub use identity::{CaseId, Category, ClueKind, Difficulty, TimelineSeverity};
pub use index::{CaseIndex, IndexStats, tokenize};
pub use loader::{CaseLoader, LoadError, LoadErrorKind, LoadResult, LoadWarning, RawCandidate};
pub use model::{
    CaseRecord, CaseSummary, Clue, CodeExample, Crisis, Solution, Symptoms, TimelineEntry,
};
pub use repository::{
    CaseFilter, CaseRepository, CaseSnapshot, RepositoryPhase, RepositoryStatus,
};
