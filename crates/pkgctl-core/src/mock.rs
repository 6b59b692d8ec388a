//! A scripted, in-memory `Backend` used by integration tests so the driver's
//! orchestration logic can be exercised without a real package database
//! (spec §9 "model as a trait ... so tests can substitute a scripted
//! back-end").

use crate::callbacks::Callbacks;
use crate::error::BackendError;
use crate::transaction::{
    Backend, InstallReason, InstalledPackage, InterruptOutcome, TargetInfo, TransactionFlags,
    TransactionHandle, TransactionSummary, TransactionType,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// One scripted outcome for `prepare`.
#[derive(Debug, Clone)]
pub enum ScriptedPrepare {
    Ok(TransactionSummary),
    Err(BackendError),
}

/// A canned, thread-safe back-end: construct it with the installed-package
/// set and canned `prepare` outcomes a test wants to see, then hand it to the
/// driver through `Arc<dyn Backend>`.
#[derive(Debug)]
pub struct ScriptedBackend {
    installed: Mutex<HashMap<String, InstalledPackage>>,
    groups: Mutex<HashMap<String, Vec<String>>>,
    next_prepare: Mutex<Vec<ScriptedPrepare>>,
    commit_fails: Mutex<Option<String>>,
    lock_held: Mutex<bool>,
    next_handle: AtomicU64,
    self_name: String,
    lock_path: String,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            installed: Mutex::new(HashMap::new()),
            groups: Mutex::new(HashMap::new()),
            next_prepare: Mutex::new(Vec::new()),
            commit_fails: Mutex::new(None),
            lock_held: Mutex::new(false),
            next_handle: AtomicU64::new(1),
            self_name: "pkgctl".to_string(),
            lock_path: "/var/lib/pkgctl/db.lck".to_string(),
        }
    }

    pub fn with_installed(self, pkg: InstalledPackage) -> Self {
        self.installed.lock().unwrap().insert(pkg.name.clone(), pkg);
        self
    }

    pub fn with_group(self, name: &str, members: &[&str]) -> Self {
        self.groups.lock().unwrap().insert(
            name.to_string(),
            members.iter().map(|s| (*s).to_string()).collect(),
        );
        self
    }

    /// Queue the outcome of the next `prepare` call. Calls beyond the queued
    /// set repeat the last entry.
    pub fn queue_prepare(&self, outcome: ScriptedPrepare) {
        self.next_prepare.lock().unwrap().push(outcome);
    }

    pub fn fail_commit(&self, reason: &str) {
        *self.commit_fails.lock().unwrap() = Some(reason.to_string());
    }
}

impl Backend for ScriptedBackend {
    fn lock_path(&self) -> &str {
        &self.lock_path
    }

    fn init(
        &self,
        _ty: TransactionType,
        _flags: TransactionFlags,
        _callbacks: std::sync::Arc<dyn Callbacks>,
    ) -> Result<TransactionHandle, BackendError> {
        let mut held = self.lock_held.lock().unwrap();
        if *held {
            return Err(BackendError::HandleLock {
                path: self.lock_path.clone(),
            });
        }
        *held = true;
        let id = self.next_handle.fetch_add(1, Ordering::SeqCst);
        Ok(TransactionHandle(id))
    }

    fn add_target(&self, _handle: TransactionHandle, _target: &str) -> Result<(), BackendError> {
        Ok(())
    }

    fn prepare(&self, _handle: TransactionHandle) -> Result<TransactionSummary, BackendError> {
        let mut queue = self.next_prepare.lock().unwrap();
        let outcome = if queue.len() > 1 {
            queue.remove(0)
        } else {
            queue
                .first()
                .cloned()
                .unwrap_or(ScriptedPrepare::Ok(TransactionSummary::default()))
        };
        match outcome {
            ScriptedPrepare::Ok(summary) => Ok(summary),
            ScriptedPrepare::Err(err) => Err(err),
        }
    }

    fn commit(&self, _handle: TransactionHandle) -> Result<(), BackendError> {
        if let Some(reason) = self.commit_fails.lock().unwrap().take() {
            return Err(BackendError::Other(reason));
        }
        Ok(())
    }

    fn release(&self, _handle: TransactionHandle) -> Result<(), BackendError> {
        *self.lock_held.lock().unwrap() = false;
        Ok(())
    }

    fn interrupt(&self, _handle: TransactionHandle) -> InterruptOutcome {
        InterruptOutcome::Stopped
    }

    fn find_installed(&self, name: &str) -> Option<InstalledPackage> {
        self.installed.lock().unwrap().get(name).cloned()
    }

    fn list_installed(&self) -> Vec<InstalledPackage> {
        let mut v: Vec<_> = self.installed.lock().unwrap().values().cloned().collect();
        v.sort_by(|a, b| a.name.cmp(&b.name));
        v
    }

    fn group_members(&self, group: &str) -> Option<Vec<String>> {
        self.groups.lock().unwrap().get(group).cloned()
    }

    fn find_owner(&self, _path: &str) -> Option<String> {
        None
    }

    fn set_install_reason(
        &self,
        name: &str,
        reason: InstallReason,
    ) -> Result<(), BackendError> {
        let mut installed = self.installed.lock().unwrap();
        match installed.get_mut(name) {
            Some(pkg) => {
                pkg.reason = reason;
                Ok(())
            }
            None => Err(BackendError::UnknownPackage(name.to_string())),
        }
    }

    fn is_self(&self, name: &str) -> bool {
        name == self.self_name
    }

    fn sync_db(&self, _repo: &str) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Convenience constructor for tests.
#[must_use]
pub fn installed(name: &str, version: &str) -> InstalledPackage {
    InstalledPackage {
        name: name.to_string(),
        version: version.to_string(),
        reason: InstallReason::Explicit,
        required_by: Vec::new(),
        in_sync_db: false,
        size: 0,
    }
}

#[must_use]
pub fn target(name: &str, new_version: &str) -> TargetInfo {
    TargetInfo {
        name: name.to_string(),
        old_version: None,
        new_version: new_version.to_string(),
        download_size: 0,
        installed_size: 0,
        replaces: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn lock_is_exclusive() {
        let backend = ScriptedBackend::new();
        let cb: Arc<dyn Callbacks> = Arc::new(crate::callbacks::NullCallbacks);
        let h1 = backend
            .init(TransactionType::Install, TransactionFlags::default(), cb.clone())
            .unwrap();
        let err = backend
            .init(TransactionType::Install, TransactionFlags::default(), cb.clone())
            .unwrap_err();
        assert!(matches!(err, BackendError::HandleLock { .. }));
        backend.release(h1).unwrap();
        backend
            .init(TransactionType::Install, TransactionFlags::default(), cb)
            .unwrap();
    }
}
