//! Typed errors surfaced by the case repository.
//!
//! Per-candidate problems never show up here: the loader reports them as
//! [`LoadError`] diagnostics. These types cover the batch level (nothing
//! usable was loaded), the query level (unknown id) and repository state
//! misuse.

use crate::casefile::{CaseId, LoadError};
use thiserror::Error;

/// The load produced zero valid records, so nothing can be served.
#[derive(Clone, Debug, Error)]
#[error("no valid cases loaded from {candidates} candidate(s); {} rejected", .diagnostics.len())]
pub struct InitializationError {
    pub candidates: usize,
    pub diagnostics: Vec<LoadError>,
}

/// Lookup for an id that is not in the current snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("case '{id}' not found")]
pub struct NotFoundError {
    pub id: CaseId,
}

#[derive(Clone, Debug, Error)]
pub enum RepositoryError {
    #[error("case repository has not been initialized")]
    NotReady,
    #[error("case repository is already initialized; use reload to replace the corpus")]
    AlreadyInitialized,
    #[error(transparent)]
    Initialization(#[from] InitializationError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
}

impl RepositoryError {
    /// True for the ordinary "no such case" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }
}
