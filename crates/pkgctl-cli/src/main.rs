//! Entry point: tracing init, signal installation, config/argument
//! resolution, dispatch to the matching operation handler (spec §2).

use pkgctl_cli::args::{self, Operation, OpLetter};
use pkgctl_cli::callbacks_impl::DriverCallbacks;
use pkgctl_cli::config::Config;
use pkgctl_cli::ops::{self, OpContext};
use pkgctl_cli::{output, signal};
use pkgctl_core::mock::ScriptedBackend;
use pkgctl_core::Callbacks;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_CONFIG_PATH: &str = "/etc/pacman.conf";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    signal::install();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let parsed = match args::parse(&argv) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.exit_code());
        }
    };

    match &parsed.operation {
        Operation::Version => {
            println!("pkgctl {}", env!("CARGO_PKG_VERSION"));
            std::process::exit(0);
        }
        Operation::Help(op) => {
            print_help(*op);
            std::process::exit(0);
        }
        _ => {}
    }

    output::set_verbose_level(parsed.globals.verbose);

    let config_path = parsed
        .globals
        .config_file
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("error: config: {err}");
            std::process::exit(2);
        }
    };
    apply_cli_overrides(&mut config, &parsed.globals);

    // The back-end library itself (dependency solver, archive extraction,
    // on-disk database, signature verification) is an external collaborator
    // (spec §1) that this workspace does not implement. `ScriptedBackend` is
    // the same in-memory stand-in used by the test suite; swapping in a real
    // back-end means constructing a different `Arc<dyn Backend>` here.
    let backend: Arc<dyn pkgctl_core::Backend> = Arc::new(ScriptedBackend::new());

    let callbacks: Arc<dyn Callbacks> = Arc::new(DriverCallbacks::new(&config));
    let ctx = OpContext {
        config: &config,
        backend: backend.as_ref(),
        callbacks,
    };

    let code = match &parsed.operation {
        Operation::Remove(opts) => ops::remove::run(&ctx, &parsed.targets, opts),
        Operation::Upgrade(opts) => ops::upgrade::run(&ctx, &parsed.targets, opts),
        Operation::Sync(opts) => ops::sync::run(&ctx, &parsed.targets, opts),
        Operation::Query(opts) => ops::query::run(&ctx, &parsed.targets, opts),
        Operation::Files(opts) => ops::files::run(&ctx, &parsed.targets, opts),
        Operation::Database(opts) => ops::database::run(&ctx, &parsed.targets, opts),
        Operation::DepTest(opts) => ops::deptest::run(&ctx, &parsed.targets, opts),
        Operation::Version | Operation::Help(_) => unreachable!("handled above"),
    };

    if let Some(sig_code) = signal::exit_code() {
        std::process::exit(sig_code);
    }
    std::process::exit(code);
}

fn apply_cli_overrides(config: &mut Config, globals: &args::GlobalOptions) {
    if let Some(root) = &globals.root_dir {
        config.root_dir = root.clone();
    }
    if let Some(db) = &globals.db_path {
        config.db_path = db.clone();
    }
    if !globals.cache_dirs.is_empty() {
        config.cache_dirs = globals.cache_dirs.clone();
    }
    if let Some(log) = &globals.log_file {
        config.log_file = Some(log.clone());
    }
    if let Some(gpg) = &globals.gpg_dir {
        config.gpg_dir = gpg.clone();
    }
    if !globals.hook_dirs.is_empty() {
        config.hook_dirs = globals.hook_dirs.clone();
    }
    if let Some(arch) = &globals.arch {
        config.architecture = Some(arch.clone());
    }
    if let Some(sysroot) = &globals.sysroot {
        config.sysroot = Some(PathBuf::from(sysroot));
    }
    if let Some(ask_mask) = globals.ask_mask {
        config.ask_mask = ask_mask;
    }
    if !globals.assume_installed.is_empty() {
        config.assume_installed = globals.assume_installed.clone();
    }
    if !globals.overwrite_globs.is_empty() {
        config.overwrite_globs = globals.overwrite_globs.clone();
    }
    if globals.no_confirm {
        config.no_confirm = true;
    }
    if globals.no_progressbar {
        config.no_progressbar = true;
    }
    if globals.print {
        config.print_uris = true;
    }
    config.verbose_level = globals.verbose;
}

fn print_help(op: Option<OpLetter>) {
    match op {
        None => {
            println!("usage: pkgctl <operation> [options] [targets...]");
            println!("operations: -R (remove), -U (upgrade), -S (sync), -Q (query),");
            println!("            -F (files), -D (database), -T (deptest)");
        }
        Some(letter) => {
            println!("usage: pkgctl -{letter} [options] [targets...]");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_cli_overrides_replaces_collection_fields() {
        let mut config = Config::default();
        config.cache_dirs = vec!["/var/cache/pkgctl/pkg/".to_string()];
        let globals = args::GlobalOptions {
            cache_dirs: vec!["/mnt/cache".to_string()],
            ..Default::default()
        };
        apply_cli_overrides(&mut config, &globals);
        assert_eq!(config.cache_dirs, vec!["/mnt/cache".to_string()]);
    }
}
