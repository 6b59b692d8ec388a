//! The four-phase transaction state machine (spec §4.8): init, add-targets,
//! prepare, commit, release. Modeled as an RAII guard over the back-end's
//! handle so release is attempted on every exit path (spec §9 "goto cleanup
//! → scoped acquisition"), the way the teacher's `TempDir` guard tears
//! itself down regardless of which branch returns.

use crate::output;
use pkgctl_core::{
    Backend, BackendError, Callbacks, FileConflictKind, PhaseFailure, TransactionFlags, TransactionHandle,
    TransactionSummary, TransactionType,
};
use std::sync::Arc;

/// Owns a `TransactionHandle` for its lifetime and always calls
/// `Backend::release` on drop, regardless of the path taken to get there
/// (spec §4.8 step 5, §9).
pub struct Transaction<'b> {
    backend: &'b dyn Backend,
    handle: TransactionHandle,
    /// Set when an earlier phase already produced a non-zero result; a
    /// failing `release` must not overwrite it (spec §4.8).
    prior_failure: bool,
}

impl<'b> Transaction<'b> {
    /// Acquire the back-end lock and start a transaction (spec §4.8 step 1).
    /// On `HandleLock`, the caller is responsible for surfacing the lock
    /// path to the user.
    pub fn begin(
        backend: &'b dyn Backend,
        ty: TransactionType,
        flags: TransactionFlags,
        callbacks: Arc<dyn Callbacks>,
    ) -> Result<Self, BackendError> {
        let handle = backend.init(ty, flags, callbacks)?;
        Ok(Self {
            backend,
            handle,
            prior_failure: false,
        })
    }

    pub fn add_target(&mut self, target: &str) -> Result<(), BackendError> {
        let result = self.backend.add_target(self.handle, target);
        if result.is_err() {
            self.prior_failure = true;
        }
        result
    }

    pub fn prepare(&mut self) -> Result<TransactionSummary, BackendError> {
        let result = self.backend.prepare(self.handle);
        if result.is_err() {
            self.prior_failure = true;
        }
        result
    }

    pub fn commit(&mut self) -> Result<(), BackendError> {
        let result = self.backend.commit(self.handle);
        if result.is_err() {
            self.prior_failure = true;
        }
        result
    }

    /// End this transaction early (sysupgrade self-upgrade sub-flow, spec
    /// §4.8) and consume `self` so `Drop` does not release twice.
    pub fn release_now(self) -> Result<(), BackendError> {
        let backend = self.backend;
        let handle = self.handle;
        std::mem::forget(self);
        backend.release(handle)
    }

    pub fn handle(&self) -> TransactionHandle {
        self.handle
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.backend.release(self.handle) {
            if !self.prior_failure {
                output::print(pkgctl_core::Level::Error, &format!("failed to release transaction: {err}"));
            }
        }
    }
}

/// Render a `BackendError` as the driver's user-visible error surface (spec
/// §4.8, §7): one top-level line, then indented `::` detail items.
pub fn render_error(err: &BackendError) {
    match err {
        BackendError::HandleLock { path } => {
            output::print(pkgctl_core::Level::Error, &format!("failed to synchronize all databases (could not lock database: {path})"));
        }
        BackendError::Phase(failure) => render_phase_failure(failure),
        other => output::print(pkgctl_core::Level::Error, &other.to_string()),
    }
}

fn render_phase_failure(failure: &PhaseFailure) {
    match failure {
        PhaseFailure::UnsatisfiedDeps(missing) => {
            output::print(pkgctl_core::Level::Error, "failed to prepare transaction (could not satisfy dependencies)");
            for dep in missing {
                eprintln!(":: {}: requires {}{}{}", dep.target, dep.dep_name, dep.modifier, dep.version.as_deref().unwrap_or(""));
            }
        }
        PhaseFailure::ConflictingDeps(conflicts) => {
            output::print(pkgctl_core::Level::Error, "failed to prepare transaction (conflicting dependencies)");
            for c in conflicts {
                eprintln!(":: {}: conflicts with {}", c.target, c.conflicting_name);
            }
        }
        PhaseFailure::FileConflicts(conflicts) => {
            output::print(pkgctl_core::Level::Error, "failed to commit transaction (conflicting files)");
            for c in conflicts {
                match c.kind {
                    FileConflictKind::Target => {
                        eprintln!(
                            ":: {} and {}: {} exists in both packages",
                            c.target,
                            c.other_target.as_deref().unwrap_or("?"),
                            c.path
                        );
                    }
                    FileConflictKind::File => {
                        eprintln!(":: {}: {} exists in filesystem", c.target, c.path);
                    }
                }
            }
        }
        PhaseFailure::DiskFull { required_mb, free_mb } => {
            output::print(pkgctl_core::Level::Error, "not enough free disk space");
            eprintln!(":: {required_mb} MB / {free_mb} MB");
        }
        PhaseFailure::PkgCorrupted(msg) => {
            output::print(pkgctl_core::Level::Error, &format!("could not commit transaction ({msg})"));
        }
    }
}

/// Renders the pre-commit summary (spec §4.8): removed packages, install
/// targets with sizes, total download/installed size, then a confirmation
/// prompt bypassed by `no_confirm` or `print_uris`.
pub fn confirm_summary(summary: &TransactionSummary, no_confirm: bool, print_uris: bool) -> bool {
    if print_uris {
        return true;
    }
    let removed: Vec<&str> = summary
        .targets
        .iter()
        .flat_map(|t| t.replaces.iter().map(String::as_str))
        .collect();
    if !removed.is_empty() {
        eprintln!("\nRemove ({}):  {}", removed.len(), removed.join("  "));
    }
    let names: Vec<String> = summary
        .targets
        .iter()
        .map(|t| format!("{}-{}", t.name, t.new_version))
        .collect();
    eprintln!("\nTargets ({}):  {}", names.len(), names.join("  "));

    let (dl_val, dl_unit) = crate::term::humanize_size(summary.total_download_size as i64, 2);
    eprintln!("\nTotal Download Size:    {dl_val:.2} {dl_unit}");
    let (inst_val, inst_unit) = crate::term::humanize_size(summary.total_installed_size_delta, 2);
    eprintln!("Net Upgrade Size:       {inst_val:.2} {inst_unit}");

    output::yesno("\nProceed with installation?", true, no_confirm, 0, None).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgctl_core::mock::{installed, ScriptedBackend};
    use pkgctl_core::NullCallbacks;

    #[test]
    fn release_runs_on_every_exit_path_including_error() {
        let backend = ScriptedBackend::new().with_installed(installed("foo", "1.0"));
        let callbacks: Arc<dyn Callbacks> = Arc::new(NullCallbacks);
        {
            let mut txn = Transaction::begin(&backend, TransactionType::Remove, TransactionFlags::default(), callbacks.clone()).unwrap();
            let _ = txn.add_target("does-not-exist");
        }
        // A second transaction must succeed, proving the first released its lock.
        let txn2 = Transaction::begin(&backend, TransactionType::Remove, TransactionFlags::default(), callbacks);
        assert!(txn2.is_ok());
    }

    #[test]
    fn release_now_consumes_self_without_double_release() {
        let backend = ScriptedBackend::new();
        let callbacks: Arc<dyn Callbacks> = Arc::new(NullCallbacks);
        let txn = Transaction::begin(&backend, TransactionType::Install, TransactionFlags::default(), callbacks).unwrap();
        assert!(txn.release_now().is_ok());
    }
}
