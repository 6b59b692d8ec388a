//! Local database queries (spec §4.9 `-Q`).

use super::{OpContext, EXIT_ERROR, EXIT_INVALID, EXIT_SUCCESS};
use crate::args::QueryOptions;
use pkgctl_core::{InstallReason, InstalledPackage, Level};

pub fn run(ctx: &OpContext, targets: &[String], opts: &QueryOptions) -> i32 {
    if opts.file {
        crate::output::print(Level::Error, "querying a package file directly requires reading its archive, which is out of scope here");
        return EXIT_ERROR;
    }
    if opts.owns {
        return owns(ctx, targets);
    }
    if opts.foreign {
        return list_matching(ctx, |p| !p.in_sync_db, opts.info);
    }
    if opts.unrequired {
        return list_matching(ctx, |p| p.required_by.is_empty() && p.reason == InstallReason::Dependency, opts.info);
    }
    if opts.groups {
        crate::output::print(Level::Error, "listing package groups requires a back-end-provided group index");
        return EXIT_ERROR;
    }
    if opts.list {
        crate::output::print(Level::Error, "listing owned files requires a back-end-provided file list");
        return EXIT_ERROR;
    }
    if opts.search {
        return search(ctx, targets);
    }
    if targets.is_empty() {
        return list_matching(ctx, |_| true, opts.info);
    }
    info_or_plain(ctx, targets, opts.info)
}

fn owns(ctx: &OpContext, targets: &[String]) -> i32 {
    if targets.is_empty() {
        crate::output::print(Level::Error, "no file specified for -o");
        return EXIT_INVALID;
    }
    let mut code = EXIT_SUCCESS;
    for path in targets {
        match ctx.backend.find_owner(path) {
            Some(owner) => {
                let version = ctx.backend.find_installed(&owner).map(|p| p.version).unwrap_or_default();
                println!("{path} is owned by {owner} {version}");
            }
            None => {
                crate::output::print(Level::Error, &format!("No package owns {path}"));
                code = EXIT_ERROR;
            }
        }
    }
    code
}

fn search(ctx: &OpContext, patterns: &[String]) -> i32 {
    let installed = ctx.backend.list_installed();
    let mut any = false;
    for pkg in &installed {
        if patterns.is_empty() || patterns.iter().any(|p| pkg.name.contains(p.as_str())) {
            println!("local/{} {}", pkg.name, pkg.version);
            any = true;
        }
    }
    if any {
        EXIT_SUCCESS
    } else {
        EXIT_ERROR
    }
}

fn list_matching(ctx: &OpContext, pred: impl Fn(&InstalledPackage) -> bool, info_level: u8) -> i32 {
    let installed = ctx.backend.list_installed();
    let matches: Vec<_> = installed.into_iter().filter(pred).collect();
    for pkg in &matches {
        print_one(pkg, info_level);
    }
    EXIT_SUCCESS
}

fn info_or_plain(ctx: &OpContext, targets: &[String], info_level: u8) -> i32 {
    let mut code = EXIT_SUCCESS;
    for name in targets {
        match ctx.backend.find_installed(name) {
            Some(pkg) => print_one(&pkg, info_level),
            None => {
                crate::output::print(Level::Error, &format!("package '{name}' was not found"));
                code = EXIT_ERROR;
            }
        }
    }
    code
}

fn print_one(pkg: &InstalledPackage, info_level: u8) {
    if info_level == 0 {
        println!("{} {}", pkg.name, pkg.version);
        return;
    }
    println!("Name            : {}", pkg.name);
    println!("Version         : {}", pkg.version);
    println!(
        "Install Reason  : {}",
        match pkg.reason {
            InstallReason::Explicit => "Explicitly installed",
            InstallReason::Dependency => "Installed as a dependency for another package",
        }
    );
    println!("Required By     : {}", if pkg.required_by.is_empty() { "None".to_string() } else { pkg.required_by.join("  ") });
    if info_level >= 2 {
        println!("Backup Files    : (not tracked without a back-end-provided file list)");
    }
    println!();
}
