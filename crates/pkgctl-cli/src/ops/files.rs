//! Sync file-database queries (spec §4.9 `-F`).
//!
//! File-level ownership search across repository file databases needs the
//! sync database's on-disk format (spec §1 non-goal); only the refresh step
//! and the local-owner fallback are implemented here.

use super::{OpContext, EXIT_ERROR, EXIT_SUCCESS};
use crate::args::FilesOptions;
use pkgctl_core::Level;

pub fn run(ctx: &OpContext, targets: &[String], opts: &FilesOptions) -> i32 {
    if opts.refresh > 0 {
        for repo in &ctx.config.repositories {
            if let Err(err) = ctx.backend.sync_db(&repo.name) {
                crate::driver::render_error(&err);
                return EXIT_ERROR;
            }
        }
    }

    if opts.owner {
        if targets.is_empty() {
            crate::output::print(Level::Error, "no file specified for -o");
            return super::EXIT_INVALID;
        }
        let mut code = EXIT_SUCCESS;
        for path in targets {
            match ctx.backend.find_owner(path) {
                Some(owner) => {
                    if opts.machine_readable {
                        println!("\0{owner}\0\0{path}");
                    } else {
                        println!("{path} is owned by {owner}");
                    }
                }
                None => {
                    crate::output::print(Level::Error, &format!("No package owns {path}"));
                    code = EXIT_ERROR;
                }
            }
        }
        return code;
    }

    if opts.search || opts.list {
        crate::output::print(
            Level::Error,
            "searching and listing sync file databases requires a back-end-provided file index",
        );
        return EXIT_ERROR;
    }

    EXIT_SUCCESS
}
