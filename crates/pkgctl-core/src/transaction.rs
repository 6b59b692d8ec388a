//! The back-end transaction facade the driver orchestrates (spec §3
//! `TransactionHandle`, §4.8).
//!
//! `Backend` is the boundary this workspace treats as an external
//! collaborator (spec §1): a real implementation would wrap a dependency
//! solver, archive extractor, on-disk database and signature verifier. None
//! of that lives here — only the shape the driver calls into, plus a
//! `ScriptedBackend` test double (see `mock`) that can stand in for it.

use crate::callbacks::Callbacks;
use crate::error::BackendError;
use std::sync::Arc;

/// The kind of mutating transaction being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Install,
    Remove,
    /// A probe transaction used by the `deptest` operation: runs dependency
    /// resolution only, never reaches commit.
    DepTest,
}

/// Per-transaction flags translated from CLI options (spec §4.9, SPEC_FULL §3
/// supplement: `nodeps`, `force`, `needed`, …).
#[derive(Debug, Clone, Default)]
pub struct TransactionFlags {
    pub no_deps: bool,
    pub no_deps_level: u8,
    pub force: bool,
    pub needed: bool,
    pub recursive: bool,
    pub unneeded: bool,
    pub cascade: bool,
    pub db_only: bool,
    pub download_only: bool,
    pub print_uris: bool,
    pub no_save: bool,
    /// `--assume-installed <dep>` (SPEC_FULL §3 supplement): treat `dep` as
    /// satisfied without it being present, for dependency resolution only.
    pub assume_installed: Vec<String>,
    /// `--overwrite <glob>` (SPEC_FULL §3 supplement): file-conflict paths
    /// matching one of these globs are overwritten rather than rejected.
    pub overwrite: Vec<String>,
}

/// An opaque handle returned by `Backend::init`. Lifecycle:
/// `Uninit -> Active -> Released`, enforced by the driver's `Transaction`
/// RAII wrapper (`pkgctl-cli::driver`), never constructed directly here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionHandle(pub(crate) u64);

/// A resolved target and its metadata, as summarized before commit
/// (spec §4.8 "driver renders a summary").
#[derive(Debug, Clone)]
pub struct TargetInfo {
    pub name: String,
    pub old_version: Option<String>,
    pub new_version: String,
    pub download_size: u64,
    pub installed_size: u64,
    pub replaces: Vec<String>,
}

/// The result of a successful `prepare`: what the transaction would do if
/// committed.
#[derive(Debug, Clone, Default)]
pub struct TransactionSummary {
    pub targets: Vec<TargetInfo>,
    pub total_download_size: u64,
    pub total_installed_size_delta: i64,
    /// `true` when the transaction includes the package manager itself
    /// alongside other targets (spec §4.8 sysupgrade sub-flow).
    pub includes_self_with_others: bool,
}

/// What happened when the driver asked a commit-in-progress transaction to
/// stop (spec §5 cancellation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// The back-end will finish committing atomically; the driver must not
    /// exit.
    StillCommitting,
    /// The back-end stopped cleanly; the driver may release and exit.
    Stopped,
}

/// Why a package was installed, for `database --asdeps` / `--asexplicit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
    Explicit,
    Dependency,
}

/// A package already present in the local database, as seen by `query`.
#[derive(Debug, Clone)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    pub reason: InstallReason,
    pub required_by: Vec<String>,
    pub in_sync_db: bool,
    pub size: u64,
}

/// The back-end facade. Everything below this trait (solving, extraction,
/// database format, network fetch, signatures) is out of scope for this
/// workspace (spec §1).
pub trait Backend: Send + Sync {
    /// Filesystem path of the process lock, surfaced on `HandleLock` errors
    /// so the user can intervene manually (spec §4.8, §7).
    fn lock_path(&self) -> &str;

    /// Begin a transaction. Fails with `BackendError::HandleLock` if another
    /// transaction is already active in this process tree.
    fn init(
        &self,
        ty: TransactionType,
        flags: TransactionFlags,
        callbacks: Arc<dyn Callbacks>,
    ) -> Result<TransactionHandle, BackendError>;

    /// Add one target (a package name, group name, virtual-provides name or
    /// local file path, depending on `ty`) to the transaction.
    fn add_target(&self, handle: TransactionHandle, target: &str) -> Result<(), BackendError>;

    /// Resolve the transaction. On success, returns what would happen if
    /// committed. On failure, returns a `PhaseFailure` describing why.
    fn prepare(&self, handle: TransactionHandle) -> Result<TransactionSummary, BackendError>;

    /// Apply the resolved transaction.
    fn commit(&self, handle: TransactionHandle) -> Result<(), BackendError>;

    /// Always attempted, on every exit path. Its failure only downgrades an
    /// already-successful return (spec §4.8).
    fn release(&self, handle: TransactionHandle) -> Result<(), BackendError>;

    /// Ask an in-flight commit to stop (spec §5 cancellation).
    fn interrupt(&self, handle: TransactionHandle) -> InterruptOutcome;

    /// Compare two version strings; delegates to `depend::vercmp`.
    fn vercmp(&self, a: &str, b: &str) -> std::cmp::Ordering {
        crate::depend::vercmp(a, b)
    }

    /// Look up one installed package by name.
    fn find_installed(&self, name: &str) -> Option<InstalledPackage>;

    /// All installed packages, in the back-end's own order.
    fn list_installed(&self) -> Vec<InstalledPackage>;

    /// Expand a package group to member package names.
    fn group_members(&self, group: &str) -> Option<Vec<String>>;

    /// The package (if any) that owns `path` on disk.
    fn find_owner(&self, path: &str) -> Option<String>;

    /// Set the install reason of an already-installed package.
    fn set_install_reason(
        &self,
        name: &str,
        reason: InstallReason,
    ) -> Result<(), BackendError>;

    /// Refresh one repository's sync database (`-Sy`). The actual network
    /// fetch and on-disk format are out of scope (spec §1); this is the
    /// single entry point the driver calls and observes through
    /// `DbRetrieveStart`/`Done`/`Failed` events.
    fn sync_db(&self, repo: &str) -> Result<(), BackendError>;

    /// `true` if `name` is the package manager's own package (sysupgrade
    /// self-upgrade sub-flow, spec §4.8).
    fn is_self(&self, name: &str) -> bool;
}
