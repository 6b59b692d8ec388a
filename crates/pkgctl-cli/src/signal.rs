//! Signal handling contract (spec §5). Installation mechanics themselves are
//! an explicit non-goal (spec §1); this module implements only the
//! observable behavior the driver must exhibit: SIGWINCH invalidates the
//! cached column width, SIGINT/SIGHUP request a transaction interrupt, and
//! SIGSEGV prints a fixed diagnostic before re-raising.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static LAST_SIGNAL: AtomicI32 = AtomicI32::new(0);

extern "C" fn handle_winch(_sig: libc::c_int) {
    crate::term::column_cache_reset();
}

extern "C" fn handle_terminate(sig: libc::c_int) {
    LAST_SIGNAL.store(sig, Ordering::SeqCst);
    INTERRUPTED.store(true, Ordering::SeqCst);
}

#[allow(unsafe_code)]
extern "C" fn handle_segv(_sig: libc::c_int) {
    eprintln!("error: pkgctl has crashed due to a segmentation fault");
    // SAFETY: restoring the default disposition and re-raising is the
    // standard crash-handler pattern so the process still dies with a
    // SIGSEGV core/exit status rather than looping back into this handler.
    unsafe {
        libc::signal(libc::SIGSEGV, libc::SIG_DFL);
        libc::raise(libc::SIGSEGV);
    }
}

/// Install the driver's signal handlers. Safe to call once at startup.
#[allow(unsafe_code)]
pub fn install() {
    // SAFETY: each handler is a plain `extern "C" fn(c_int)` matching
    // `sighandler_t`'s expected signature, and `install` runs once before
    // any other thread is spawned.
    unsafe {
        libc::signal(libc::SIGWINCH, handle_winch as libc::sighandler_t);
        libc::signal(libc::SIGINT, handle_terminate as libc::sighandler_t);
        libc::signal(libc::SIGHUP, handle_terminate as libc::sighandler_t);
        libc::signal(libc::SIGSEGV, handle_segv as libc::sighandler_t);
    }
}

/// `true` once SIGINT or SIGHUP has been received. The driver polls this at
/// cooperative points and during back-end re-entrant callbacks (spec §5).
#[must_use]
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Exit code for a signal-terminated run: `128 + signum` (spec §6).
#[must_use]
pub fn exit_code() -> Option<i32> {
    let sig = LAST_SIGNAL.load(Ordering::SeqCst);
    if sig == 0 {
        None
    } else {
        Some(128 + sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_is_128_plus_signum_once_set() {
        LAST_SIGNAL.store(libc::SIGINT, Ordering::SeqCst);
        assert_eq!(exit_code(), Some(128 + libc::SIGINT));
        LAST_SIGNAL.store(0, Ordering::SeqCst);
    }
}
