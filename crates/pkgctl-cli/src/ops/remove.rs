//! Package removal (spec §4.9 `-R`): group-name targets expand to their
//! members with a prompt before the transaction begins.

use super::{OpContext, EXIT_ERROR, EXIT_SUCCESS};
use crate::args::RemoveOptions;
use crate::driver::{self, Transaction};
use crate::output;
use pkgctl_core::{Level, TransactionFlags, TransactionType};

pub fn run(ctx: &OpContext, targets: &[String], opts: &RemoveOptions) -> i32 {
    if targets.is_empty() {
        output::print(Level::Error, "no targets specified (use -h for help)");
        return super::EXIT_INVALID;
    }

    let mut expanded = Vec::new();
    for target in targets {
        if let Some(members) = ctx.backend.group_members(target) {
            let prompt = format!(":: Remove all members of group {target}?\n    {}", members.join(" "));
            if output::yesno(&prompt, true, ctx.config.no_confirm, ctx.config.ask_mask, None).unwrap_or(true) {
                expanded.extend(members);
            }
        } else {
            expanded.push(target.clone());
        }
    }
    if expanded.is_empty() {
        return EXIT_SUCCESS;
    }

    let flags = TransactionFlags {
        no_deps: opts.no_deps > 0,
        no_deps_level: opts.no_deps,
        recursive: opts.recursive > 0,
        cascade: opts.cascade,
        unneeded: opts.unneeded,
        no_save: opts.nosave,
        ..TransactionFlags::default()
    };

    let mut txn = match Transaction::begin(ctx.backend, TransactionType::Remove, flags, ctx.callbacks.clone()) {
        Ok(t) => t,
        Err(err) => {
            driver::render_error(&err);
            return EXIT_ERROR;
        }
    };

    for target in &expanded {
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

    if !driver::confirm_summary(&summary, ctx.config.no_confirm, false) {
        return EXIT_SUCCESS;
    }

    if let Err(err) = txn.commit() {
        driver::render_error(&err);
        return EXIT_ERROR;
    }
    EXIT_SUCCESS
}
