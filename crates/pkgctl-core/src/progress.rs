//! The transaction-phase progress callback (spec §4.6, distinct from the
//! per-file download progress in `download.rs`).

/// Which transaction phase a progress update belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    AddStart,
    UpgradeStart,
    DowngradeStart,
    ReinstallStart,
    RemoveStart,
    ConflictsStart,
    DiskspaceStart,
    IntegrityStart,
    LoadStart,
    KeyringStart,
}

impl ProgressEvent {
    /// The label used in the `(i/N) <opname> <pkgname>` progress line.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ProgressEvent::AddStart => "installing",
            ProgressEvent::UpgradeStart => "upgrading",
            ProgressEvent::DowngradeStart => "downgrading",
            ProgressEvent::ReinstallStart => "reinstalling",
            ProgressEvent::RemoveStart => "removing",
            ProgressEvent::ConflictsStart => "checking for file conflicts",
            ProgressEvent::DiskspaceStart => "checking available disk space",
            ProgressEvent::IntegrityStart => "checking package integrity",
            ProgressEvent::LoadStart => "loading package files",
            ProgressEvent::KeyringStart => "checking keys in keyring",
        }
    }
}
