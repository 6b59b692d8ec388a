//! Back-end error taxonomy (spec §7.3).

use crate::depend::{Conflict, DepMissing, FileConflict};
use thiserror::Error;

/// Structured payload attached to a failed `prepare`/`commit` phase
/// (spec §4.8).
#[derive(Debug, Clone)]
pub enum PhaseFailure {
    UnsatisfiedDeps(Vec<DepMissing>),
    ConflictingDeps(Vec<Conflict>),
    FileConflicts(Vec<FileConflict>),
    DiskFull { required_mb: u64, free_mb: u64 },
    PkgCorrupted(String),
}

/// Errors a `Backend` implementation may return.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("failed to lock database at {path}")]
    HandleLock { path: String },

    #[error("failed to synchronize {repo}: {reason}")]
    DbSyncFailed { repo: String, reason: String },

    #[error("target not found: {0}")]
    UnknownPackage(String),

    #[error("group not found: {0}")]
    UnknownGroup(String),

    #[error("transaction phase failed")]
    Phase(PhaseFailure),

    #[error("{0}")]
    Other(String),
}
