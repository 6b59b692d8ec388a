//! The closed event variant set delivered through `Callbacks::event` (spec §4.6).

/// The kind of package operation underway for a `PackageOperationStart`/`Done`
/// pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageOp {
    Install,
    Upgrade,
    Reinstall,
    Downgrade,
    Remove,
}

/// A single package install/upgrade/remove step inside `PackageOperation*`.
#[derive(Debug, Clone)]
pub struct PackageOperationInfo {
    pub op: PackageOp,
    pub target: String,
    /// Version being replaced, for upgrade/downgrade/reinstall/remove.
    pub old_version: Option<String>,
    /// Version being installed, for install/upgrade/downgrade/reinstall.
    pub new_version: Option<String>,
    /// Optional dependency names newly gained relative to `old_version`.
    pub new_optdepends: Vec<String>,
}

/// A retrieval target (sync database or package file) for `DbRetrieve*` /
/// `PkgRetrieve*` events.
#[derive(Debug, Clone)]
pub struct RetrieveInfo {
    pub repo_or_pkg: String,
    pub error: Option<String>,
}

/// Closed event variant set, mirroring the `alpm_event_t` union this driver
/// observes (spec §4.6).
#[derive(Debug, Clone)]
pub enum Event {
    CheckDepsStart,
    CheckDepsDone,
    ResolveDepsStart,
    ResolveDepsDone,
    InterConflictsStart,
    InterConflictsDone,
    FileConflictsStart,
    FileConflictsDone,
    IntegrityStart,
    IntegrityDone,
    KeyringStart,
    KeyringDone,
    LoadStart,
    LoadDone,
    DiskspaceStart,
    DiskspaceDone,
    TransactionStart,
    TransactionDone,
    PackageOperationStart(PackageOperationInfo),
    PackageOperationDone(PackageOperationInfo),
    HookStart,
    HookDone,
    HookRunStart { name: String, desc: String },
    HookRunDone { name: String, desc: String },
    DatabaseMissing { repo: String },
    PacnewCreated { path: String },
    PacsaveCreated { path: String },
    OptdepRemoval { target: String, optdep: String },
    ScriptletInfo { line: String },
    DbRetrieveStart(RetrieveInfo),
    DbRetrieveDone(RetrieveInfo),
    DbRetrieveFailed(RetrieveInfo),
    PkgRetrieveStart(RetrieveInfo),
    PkgRetrieveDone(RetrieveInfo),
    PkgRetrieveFailed(RetrieveInfo),
    KeyDownloadStart { keyid: String },
    KeyDownloadDone { keyid: String },
}

impl Event {
    /// `true` for the events that open a retrieval window during which the
    /// multibar is active and log output must be deferred (spec §4.6).
    #[must_use]
    pub fn starts_progress(&self) -> bool {
        matches!(self, Event::PkgRetrieveStart(_) | Event::DbRetrieveStart(_))
    }

    /// `true` for the matching end of a retrieval window.
    #[must_use]
    pub fn ends_progress(&self) -> bool {
        matches!(
            self,
            Event::PkgRetrieveDone(_)
                | Event::PkgRetrieveFailed(_)
                | Event::DbRetrieveDone(_)
                | Event::DbRetrieveFailed(_)
        )
    }
}
