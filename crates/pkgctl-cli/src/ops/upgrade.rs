//! Install / upgrade / freshen from local package files (spec §4.9 `-U`).
//!
//! URL targets are handed to the back-end unchanged: the network fetcher
//! that would resolve them to a local cache path is an explicit external
//! collaborator (spec §1), so there is nothing for this layer to rewrite.

use super::{OpContext, EXIT_ERROR, EXIT_SUCCESS};
use crate::args::UpgradeOptions;
use crate::driver::{self, Transaction};
use crate::output;
use pkgctl_core::{Level, TransactionFlags, TransactionType};

pub fn run(ctx: &OpContext, targets: &[String], opts: &UpgradeOptions) -> i32 {
    if targets.is_empty() {
        output::print(Level::Error, "no targets specified (use -h for help)");
        return super::EXIT_INVALID;
    }

    let flags = TransactionFlags {
        no_deps: opts.no_deps > 0,
        no_deps_level: opts.no_deps,
        force: opts.force,
        download_only: opts.download_only,
        print_uris: ctx.config.print_uris,
        assume_installed: ctx.config.assume_installed.clone(),
        overwrite: ctx.config.overwrite_globs.clone(),
        ..TransactionFlags::default()
    };

    let mut txn = match Transaction::begin(ctx.backend, TransactionType::Install, flags, ctx.callbacks.clone()) {
        Ok(t) => t,
        Err(err) => {
            driver::render_error(&err);
            return EXIT_ERROR;
        }
    };

    for target in targets {
        if let Err(err) = txn.add_target(target) {
            driver::render_error(&err);
            return EXIT_ERROR;
        }
    }

    let summary = match txn.prepare() {
        Ok(summary) => summary,
        Err(err) => {
            driver::render_error(&err);
            return EXIT_ERROR;
        }
    };

    // Unlike `-Syu` (spec §4.8 sysupgrade sub-flow, see `ops/sync.rs`),
    // installing local package files has no "re-exec after self-upgrade"
    // hazard in the original driver: `-U` commits whatever was named on the
    // command line in one pass (original_source/src/pacman/upgrade.c).

    if !driver::confirm_summary(&summary, ctx.config.no_confirm, ctx.config.print_uris) {
        return EXIT_SUCCESS;
    }
    if ctx.config.print_uris || opts.download_only {
        return EXIT_SUCCESS;
    }

    if let Err(err) = txn.commit() {
        driver::render_error(&err);
        return EXIT_ERROR;
    }
    EXIT_SUCCESS
}
