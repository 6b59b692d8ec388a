//! Back-end interface boundary.
//!
//! This crate defines the contract between the front-end driver
//! (`pkgctl-cli`) and a package-management back-end library — the dependency
//! solver, archive extractor, on-disk database and signature verifier are
//! all treated as out of scope and live behind the `Backend` trait. A real
//! back-end implements `Backend`; the driver implements `Callbacks` and hands
//! it to the back-end. `mock::ScriptedBackend` is a scripted stand-in used by
//! integration tests.

pub mod callbacks;
pub mod depend;
pub mod download;
pub mod error;
pub mod events;
pub mod log;
pub mod mock;
pub mod progress;
pub mod question;
pub mod transaction;

pub use callbacks::Callbacks;
pub use depend::{vercmp, Conflict, DepMissing, DepMod, Depend, FileConflict, FileConflictKind};
pub use download::{DownloadEvent, DownloadResult};
pub use error::{BackendError, PhaseFailure};
pub use events::{Event, PackageOp, PackageOperationInfo, RetrieveInfo};
pub use log::Level;
pub use progress::ProgressEvent;
pub use question::{Answer, Question, QuestionKind, QuestionPayload};
pub use transaction::{
    Backend, InstallReason, InstalledPackage, InterruptOutcome, TargetInfo, TransactionFlags,
    TransactionHandle, TransactionSummary, TransactionType,
};
