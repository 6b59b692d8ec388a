//! Repository sync operations (spec §4.9 `-S`): cache cleaning, database
//! refresh, system upgrade and name-based installs.
//!
//! Listing/searching/describing sync-repository *contents* (`-s`, `-g`,
//! `-i`, `-l` against remote package metadata) needs the sync database's
//! on-disk format and query surface, which spec §1 places out of scope;
//! those branches report that plainly instead of fabricating results.

use super::{OpContext, EXIT_ERROR, EXIT_SUCCESS};
use crate::args::SyncOptions;
use crate::driver::{self, Transaction};
use crate::output;
use pkgctl_core::{Callbacks, Event, Level, RetrieveInfo, TransactionFlags, TransactionType};
use std::fs;

pub fn run(ctx: &OpContext, targets: &[String], opts: &SyncOptions) -> i32 {
    if opts.clean > 0 {
        return clean_cache(ctx, opts.clean);
    }
    if opts.refresh > 0 {
        let code = refresh(ctx);
        if code != EXIT_SUCCESS {
            return code;
        }
        if !opts.sysupgrade && targets.is_empty() {
            return EXIT_SUCCESS;
        }
    }
    if opts.search || opts.groups || opts.info > 0 || opts.list {
        output::print(
            Level::Error,
            "listing and searching sync repositories requires a back-end-provided database query surface",
        );
        return EXIT_ERROR;
    }

    if opts.sysupgrade {
        return sysupgrade(ctx, targets, opts);
    }

    if targets.is_empty() {
        output::print(Level::Error, "no targets specified (use -h for help)");
        return super::EXIT_INVALID;
    }
    install_targets(ctx, targets, opts)
}

/// Expand group-name targets to their members, prompting per group (spec
/// §4.9 `-S`). Shared by the plain install path and the sysupgrade path,
/// since `-Syu <extra targets>` can name additional groups alongside the
/// implicit whole-system upgrade.
fn expand_group_targets(ctx: &OpContext, targets: &[String]) -> Vec<String> {
    let mut expanded = Vec::new();
    for target in targets {
        if let Some(members) = ctx.backend.group_members(target) {
            let prompt = format!(":: Install all members of group {target}?\n    {}", members.join(" "));
            if output::yesno(&prompt, true, ctx.config.no_confirm, ctx.config.ask_mask, None).unwrap_or(true) {
                expanded.extend(members);
            }
        } else {
            expanded.push(target.clone());
        }
    }
    expanded
}

fn clean_cache(ctx: &OpContext, level: u8) -> i32 {
    let prompt = if level >= 2 {
        "Do you want to remove ALL files from cache?"
    } else {
        "Do you want to remove all other packages from cache?"
    };
    if !output::yesno(prompt, false, ctx.config.no_confirm, ctx.config.ask_mask, None).unwrap_or(false) {
        return EXIT_SUCCESS;
    }
    let keep: std::collections::HashSet<String> = if level >= 2 {
        std::collections::HashSet::new()
    } else {
        ctx.backend
            .list_installed()
            .into_iter()
            .map(|p| format!("{}-{}", p.name, p.version))
            .collect()
    };
    for dir in &ctx.config.cache_dirs {
        let Ok(entries) = fs::read_dir(dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if level >= 2 || !keep.iter().any(|k| stem.starts_with(k.as_str())) {
                let _ = fs::remove_file(&path);
            }
        }
    }
    EXIT_SUCCESS
}

fn refresh(ctx: &OpContext) -> i32 {
    for repo in &ctx.config.repositories {
        if let Some(ts) = crate::dbinfo::read_lastupdate(&ctx.config.db_path, &repo.name) {
            tracing::debug!(repo = %repo.name, last_update = %ts, "database: last synced");
        }
        ctx.callbacks.event(&Event::DbRetrieveStart(RetrieveInfo {
            repo_or_pkg: repo.name.clone(),
            error: None,
        }));
        match ctx.backend.sync_db(&repo.name) {
            Ok(()) => ctx.callbacks.event(&Event::DbRetrieveDone(RetrieveInfo {
                repo_or_pkg: repo.name.clone(),
                error: None,
            })),
            Err(err) => {
                ctx.callbacks.event(&Event::DbRetrieveFailed(RetrieveInfo {
                    repo_or_pkg: repo.name.clone(),
                    error: Some(err.to_string()),
                }));
                driver::render_error(&err);
                return EXIT_ERROR;
            }
        }
    }
    EXIT_SUCCESS
}

fn sysupgrade(ctx: &OpContext, targets: &[String], opts: &SyncOptions) -> i32 {
    let flags = TransactionFlags {
        no_deps: opts.no_deps > 0,
        no_deps_level: opts.no_deps,
        print_uris: ctx.config.print_uris || opts.print_uris,
        download_only: opts.download_only,
        assume_installed: ctx.config.assume_installed.clone(),
        overwrite: ctx.config.overwrite_globs.clone(),
        ..TransactionFlags::default()
    };
    let expanded = expand_group_targets(ctx, targets);
    let mut txn = match Transaction::begin(ctx.backend, TransactionType::Install, flags.clone(), ctx.callbacks.clone()) {
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
        Ok(s) => s,
        Err(err) => {
            driver::render_error(&err);
            return EXIT_ERROR;
        }
    };
    if summary.targets.is_empty() {
        output::print(Level::Info, "nothing to do");
        return EXIT_SUCCESS;
    }

    // Sysupgrade self-upgrade sub-flow (spec §4.8, original_source/src/pacman/sync.c):
    // if the package manager itself is among the upgrade targets alongside
    // others, prompt to upgrade it alone first so the running binary never
    // sees a partial upgrade.
    if summary.includes_self_with_others {
        let self_target = summary
            .targets
            .iter()
            .map(|t| t.name.clone())
            .find(|name| ctx.backend.is_self(name));
        if let Some(self_target) = self_target {
            let proceed = output::yesno(
                ":: The package manager itself has an update available. Upgrade it first?",
                true,
                ctx.config.no_confirm,
                ctx.config.ask_mask,
                None,
            )
            .unwrap_or(true);
            if proceed {
                // Release the original (all-targets) transaction without
                // committing it: only the self-target is allowed through in
                // this pass.
                if let Err(err) = txn.release_now() {
                    driver::render_error(&err);
                    return EXIT_ERROR;
                }
                let mut txn2 = match Transaction::begin(ctx.backend, TransactionType::Install, flags, ctx.callbacks.clone()) {
                    Ok(t) => t,
                    Err(err) => {
                        driver::render_error(&err);
                        return EXIT_ERROR;
                    }
                };
                if let Err(err) = txn2.add_target(&self_target) {
                    driver::render_error(&err);
                    return EXIT_ERROR;
                }
                if let Err(err) = txn2.prepare() {
                    driver::render_error(&err);
                    return EXIT_ERROR;
                }
                if let Err(err) = txn2.commit() {
                    driver::render_error(&err);
                    return EXIT_ERROR;
                }
                return EXIT_SUCCESS;
            }
        }
    }

    if !driver::confirm_summary(&summary, ctx.config.no_confirm, ctx.config.print_uris || opts.print_uris) {
        return EXIT_SUCCESS;
    }
    if ctx.config.print_uris || opts.print_uris || opts.download_only {
        return EXIT_SUCCESS;
    }
    if let Err(err) = txn.commit() {
        driver::render_error(&err);
        return EXIT_ERROR;
    }
    EXIT_SUCCESS
}

fn install_targets(ctx: &OpContext, targets: &[String], opts: &SyncOptions) -> i32 {
    let flags = TransactionFlags {
        no_deps: opts.no_deps > 0,
        no_deps_level: opts.no_deps,
        print_uris: ctx.config.print_uris || opts.print_uris,
        download_only: opts.download_only,
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
    let expanded = expand_group_targets(ctx, targets);
    for target in &expanded {
        if let Err(err) = txn.add_target(target) {
            driver::render_error(&err);
            return EXIT_ERROR;
        }
    }
    let summary = match txn.prepare() {
        Ok(s) => s,
        Err(err) => {
            driver::render_error(&err);
            return EXIT_ERROR;
        }
    };
    if !driver::confirm_summary(&summary, ctx.config.no_confirm, ctx.config.print_uris || opts.print_uris) {
        return EXIT_SUCCESS;
    }
    if ctx.config.print_uris || opts.print_uris || opts.download_only {
        return EXIT_SUCCESS;
    }
    if let Err(err) = txn.commit() {
        driver::render_error(&err);
        return EXIT_ERROR;
    }
    EXIT_SUCCESS
}
