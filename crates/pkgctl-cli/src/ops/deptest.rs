//! Dependency probe (spec §4.9 `-T`): runs a transaction only through
//! `prepare`, never `commit`, and maps the outcome to the dedicated exit
//! codes `0`/`126`/`127`. `--vercmp` bypasses the transaction entirely.

use super::OpContext;
use crate::args::DepTestOptions;
use crate::driver::Transaction;
use pkgctl_core::{BackendError, Level, PhaseFailure, TransactionFlags, TransactionType};

pub const EXIT_SATISFIED: i32 = 0;
/// Reserved for unsatisfied deps that were then auto-resolved via `-D`'s
/// resolver; this driver never models that resolver, so a plain `-T` probe
/// never produces this code (original_source/src/pacman/deptest.c).
pub const EXIT_MISSING_DEPS: i32 = 126;
pub const EXIT_CONFLICT: i32 = 127;

pub fn run(ctx: &OpContext, targets: &[String], opts: &DepTestOptions) -> i32 {
    if opts.vercmp {
        return vercmp(ctx, targets);
    }

    let mut txn = match Transaction::begin(ctx.backend, TransactionType::DepTest, TransactionFlags::default(), ctx.callbacks.clone()) {
        Ok(t) => t,
        Err(_) => return EXIT_CONFLICT,
    };
    for target in targets {
        if txn.add_target(target).is_err() {
            return EXIT_CONFLICT;
        }
    }
    match txn.prepare() {
        Ok(_) => EXIT_SATISFIED,
        Err(BackendError::Phase(PhaseFailure::UnsatisfiedDeps(missing))) => {
            for dep in &missing {
                eprintln!(":: {}: requires {}{}{}", dep.target, dep.dep_name, dep.modifier, dep.version.as_deref().unwrap_or(""));
            }
            // 126 is reserved for the case where missing deps were found and
            // then successfully auto-resolved; this plain probe never
            // attempts that resolution, so unsatisfied deps here always
            // fall through to 127 (original_source/src/pacman/deptest.c).
            EXIT_CONFLICT
        }
        Err(_) => EXIT_CONFLICT,
    }
}

fn vercmp(ctx: &OpContext, targets: &[String]) -> i32 {
    if targets.len() != 2 {
        crate::output::print(Level::Error, "--vercmp requires exactly two version arguments");
        return super::EXIT_INVALID;
    }
    let ordering = ctx.backend.vercmp(&targets[0], &targets[1]);
    let code = match ordering {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    };
    println!("{code}");
    EXIT_SATISFIED
}
