//! Install-reason mutation on already-installed packages (spec §4.9 `-D`).

use super::{OpContext, EXIT_ERROR, EXIT_SUCCESS};
use crate::args::DatabaseOptions;
use crate::driver::Transaction;
use pkgctl_core::{InstallReason, Level, TransactionFlags, TransactionType};

pub fn run(ctx: &OpContext, targets: &[String], opts: &DatabaseOptions) -> i32 {
    if targets.is_empty() {
        crate::output::print(Level::Error, "no targets specified (use -h for help)");
        return super::EXIT_INVALID;
    }
    let reason = if opts.as_deps {
        InstallReason::Dependency
    } else if opts.as_explicit {
        InstallReason::Explicit
    } else {
        crate::output::print(Level::Error, "either --asdeps or --asexplicit is required");
        return super::EXIT_INVALID;
    };

    // The lock is still acquired through the transaction facade even though
    // this mutation never reaches prepare/commit (spec §4.9).
    let txn = match Transaction::begin(ctx.backend, TransactionType::DepTest, TransactionFlags::default(), ctx.callbacks.clone()) {
        Ok(t) => t,
        Err(err) => {
            crate::driver::render_error(&err);
            return EXIT_ERROR;
        }
    };

    let mut code = EXIT_SUCCESS;
    for name in targets {
        if let Err(err) = ctx.backend.set_install_reason(name, reason) {
            crate::driver::render_error(&err);
            code = EXIT_ERROR;
        }
    }
    drop(txn);
    code
}
