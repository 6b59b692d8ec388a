//! Hand-rolled argument parser (spec §4.5).
//!
//! `clap`'s derive `Subcommand` cannot express this grammar: short letters
//! are polysemous per operation (`-s` means `--search` under Query/Sync but
//! `--recursive` under Remove), and the operation itself is selected by
//! whichever of several mutually exclusive flags appears anywhere in argv,
//! not by a leading subcommand word. The parser below does the same
//! two-pass trick the original driver does: scan once for the operation
//! letter, then reinterpret every flag character under that operation's
//! table (SPEC_FULL.md, C5).

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArgsError {
    #[error("only one operation may be used at a time")]
    MultipleOperations,

    #[error("no operation specified (use -h for help)")]
    NoOperation,

    #[error("invalid option '{0}'")]
    UnknownOption(String),

    #[error("option '{0}' requires an argument")]
    MissingValue(String),

    #[error("no targets specified (use -h for help)")]
    MissingTargets,
}

impl ArgsError {
    /// Every argument error is exit code 2 (spec §4.5, §7).
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// Options recognized regardless of operation (spec §4.4 CLI-override half).
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub root_dir: Option<String>,
    pub db_path: Option<String>,
    pub config_file: Option<String>,
    pub cache_dirs: Vec<String>,
    pub log_file: Option<String>,
    pub gpg_dir: Option<String>,
    pub hook_dirs: Vec<String>,
    pub arch: Option<String>,
    pub no_confirm: bool,
    pub confirm: bool,
    pub color: Option<ColorChoice>,
    pub verbose: u8,
    pub debug: bool,
    pub no_progressbar: bool,
    pub print: bool,
    /// SPEC_FULL §3 supplement: alternate install root for cross-rooted ops.
    pub sysroot: Option<String>,
    /// `--ask <number>`: pre-specify answers for questions (spec §3 `ask_mask`).
    pub ask_mask: Option<u32>,
    /// `--assume-installed <dep>` (SPEC_FULL §3 supplement, repeatable).
    pub assume_installed: Vec<String>,
    /// `--overwrite <glob>` (SPEC_FULL §3 supplement, repeatable).
    pub overwrite_globs: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    pub recursive: u8,
    pub nosave: bool,
    pub cascade: bool,
    pub unneeded: bool,
    pub no_deps: u8,
}

#[derive(Debug, Clone, Default)]
pub struct UpgradeOptions {
    pub no_deps: u8,
    pub force: bool,
    pub download_only: bool,
    pub as_deps: bool,
    pub as_explicit: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub clean: u8,
    pub refresh: u8,
    pub sysupgrade: bool,
    pub search: bool,
    pub groups: bool,
    pub info: u8,
    pub list: bool,
    pub download_only: bool,
    pub print_uris: bool,
    pub no_deps: u8,
    pub as_deps: bool,
    pub as_explicit: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub search: bool,
    pub groups: bool,
    pub info: u8,
    pub list: bool,
    pub owns: bool,
    pub foreign: bool,
    pub unrequired: bool,
    pub file: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FilesOptions {
    pub owner: bool,
    pub search: bool,
    pub list: bool,
    pub refresh: u8,
    pub machine_readable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DatabaseOptions {
    pub as_deps: bool,
    pub as_explicit: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DepTestOptions {
    /// `--vercmp`: bypass the transaction and compare two targets directly
    /// (spec §4.9). The two operands arrive as ordinary positional targets.
    pub vercmp: bool,
}

#[derive(Debug, Clone)]
pub enum Operation {
    Remove(RemoveOptions),
    Upgrade(UpgradeOptions),
    Sync(SyncOptions),
    Query(QueryOptions),
    Files(FilesOptions),
    Database(DatabaseOptions),
    DepTest(DepTestOptions),
    Help(Option<OpLetter>),
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpLetter {
    Remove,
    Upgrade,
    Sync,
    Query,
    Files,
    Database,
    DepTest,
}

impl fmt::Display for OpLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            OpLetter::Remove => 'R',
            OpLetter::Upgrade => 'U',
            OpLetter::Sync => 'S',
            OpLetter::Query => 'Q',
            OpLetter::Files => 'F',
            OpLetter::Database => 'D',
            OpLetter::DepTest => 'T',
        };
        write!(f, "{c}")
    }
}

#[derive(Debug, Clone)]
pub struct ParsedArgs {
    pub operation: Operation,
    pub globals: GlobalOptions,
    pub targets: Vec<String>,
}

/// One decomposed argv token.
enum Tok {
    Long(String, Option<String>),
    Short(Vec<char>),
    Positional(String),
}

fn tokenize(argv: &[String]) -> Vec<Tok> {
    let mut out = Vec::new();
    let mut positional_only = false;
    for arg in argv {
        if positional_only {
            out.push(Tok::Positional(arg.clone()));
            continue;
        }
        if arg == "--" {
            positional_only = true;
            continue;
        }
        if let Some(rest) = arg.strip_prefix("--") {
            match rest.split_once('=') {
                Some((name, value)) => out.push(Tok::Long(name.to_string(), Some(value.to_string()))),
                None => out.push(Tok::Long(rest.to_string(), None)),
            }
        } else if let Some(rest) = arg.strip_prefix('-') {
            if rest.is_empty() {
                out.push(Tok::Positional(arg.clone()));
            } else {
                out.push(Tok::Short(rest.chars().collect()));
            }
        } else {
            out.push(Tok::Positional(arg.clone()));
        }
    }
    out
}

/// Long option names that always select an operation, mapped to their letter.
fn long_op_letter(name: &str) -> Option<OpLetter> {
    match name {
        "remove" => Some(OpLetter::Remove),
        "upgrade" => Some(OpLetter::Upgrade),
        "sync" => Some(OpLetter::Sync),
        "query" => Some(OpLetter::Query),
        "files" => Some(OpLetter::Files),
        "database" => Some(OpLetter::Database),
        "deptest" => Some(OpLetter::DepTest),
        _ => None,
    }
}

fn short_op_letter(c: char) -> Option<OpLetter> {
    match c {
        'R' => Some(OpLetter::Remove),
        'U' => Some(OpLetter::Upgrade),
        'S' => Some(OpLetter::Sync),
        'Q' => Some(OpLetter::Query),
        'F' => Some(OpLetter::Files),
        'D' => Some(OpLetter::Database),
        'T' => Some(OpLetter::DepTest),
        _ => None,
    }
}

/// Parse `argv` (not including `argv[0]`) into an `Operation` plus targets
/// (spec §4.5). `--help`/`--version` win immediately over everything else.
pub fn parse(argv: &[String]) -> Result<ParsedArgs, ArgsError> {
    let tokens = tokenize(argv);

    let mut saw_help = false;
    let mut saw_version = false;
    let mut op_letter: Option<OpLetter> = None;

    for tok in &tokens {
        match tok {
            Tok::Long(name, _) => {
                if name == "help" {
                    saw_help = true;
                } else if name == "version" {
                    saw_version = true;
                } else if let Some(letter) = long_op_letter(name) {
                    set_operation(&mut op_letter, letter)?;
                }
            }
            Tok::Short(chars) => {
                for &c in chars {
                    if c == 'h' {
                        saw_help = true;
                    } else if c == 'V' {
                        saw_version = true;
                    } else if let Some(letter) = short_op_letter(c) {
                        set_operation(&mut op_letter, letter)?;
                    }
                }
            }
            Tok::Positional(_) => {}
        }
    }

    if saw_version {
        return Ok(ParsedArgs {
            operation: Operation::Version,
            globals: GlobalOptions::default(),
            targets: Vec::new(),
        });
    }
    if saw_help {
        return Ok(ParsedArgs {
            operation: Operation::Help(op_letter),
            globals: GlobalOptions::default(),
            targets: Vec::new(),
        });
    }
    let op_letter = op_letter.ok_or(ArgsError::NoOperation)?;

    let mut globals = GlobalOptions::default();
    let mut targets = Vec::new();
    let mut remove = RemoveOptions::default();
    let mut upgrade = UpgradeOptions::default();
    let mut sync = SyncOptions::default();
    let mut query = QueryOptions::default();
    let mut files = FilesOptions::default();
    let mut database = DatabaseOptions::default();
    let mut deptest = DepTestOptions::default();

    let mut iter = tokens.into_iter().peekable();
    while let Some(tok) = iter.next() {
        match tok {
            Tok::Positional(value) => targets.push(value),
            Tok::Long(name, value) => {
                if long_op_letter(&name).is_some() {
                    continue;
                }
                let value = match value {
                    Some(v) => Some(v),
                    None if long_takes_value(&name) => match iter.next() {
                        Some(Tok::Positional(v)) => Some(v),
                        _ => return Err(ArgsError::MissingValue(name.clone())),
                    },
                    None => None,
                };
                if apply_global_long(&mut globals, &name, value.as_deref())? {
                    continue;
                }
                let consumed_value = apply_op_long(
                    op_letter,
                    &name,
                    value.as_deref(),
                    &mut remove,
                    &mut upgrade,
                    &mut sync,
                    &mut query,
                    &mut files,
                    &mut database,
                    &mut deptest,
                )?;
                let _ = consumed_value;
            }
            Tok::Short(chars) => {
                for c in chars {
                    if short_op_letter(c).is_some() {
                        continue;
                    }
                    if apply_global_short(&mut globals, c) {
                        continue;
                    }
                    apply_op_short(
                        op_letter,
                        c,
                        &mut remove,
                        &mut upgrade,
                        &mut sync,
                        &mut query,
                        &mut files,
                        &mut database,
                        &mut deptest,
                    )?;
                }
            }
        }
    }

    let operation = match op_letter {
        OpLetter::Remove => Operation::Remove(remove),
        OpLetter::Upgrade => Operation::Upgrade(upgrade),
        OpLetter::Sync => Operation::Sync(sync),
        OpLetter::Query => Operation::Query(query),
        OpLetter::Files => Operation::Files(files),
        OpLetter::Database => Operation::Database(database),
        OpLetter::DepTest => Operation::DepTest(deptest),
    };

    Ok(ParsedArgs {
        operation,
        globals,
        targets,
    })
}

fn set_operation(slot: &mut Option<OpLetter>, letter: OpLetter) -> Result<(), ArgsError> {
    match slot {
        None => {
            *slot = Some(letter);
            Ok(())
        }
        Some(existing) if *existing == letter => Ok(()),
        Some(_) => Err(ArgsError::MultipleOperations),
    }
}

/// Long options whose value may arrive as a separate argv token
/// (`--dbpath /custom`) rather than only `--dbpath=/custom`.
fn long_takes_value(name: &str) -> bool {
    matches!(
        name,
        "root"
            | "dbpath"
            | "config"
            | "cachedir"
            | "logfile"
            | "gpgdir"
            | "hookdir"
            | "arch"
            | "sysroot"
            | "color"
            | "ask"
            | "assume-installed"
            | "overwrite"
    )
}

fn apply_global_long(globals: &mut GlobalOptions, name: &str, value: Option<&str>) -> Result<bool, ArgsError> {
    let need = |v: Option<&str>| v.map(str::to_string).ok_or_else(|| ArgsError::MissingValue(name.to_string()));
    match name {
        "root" => globals.root_dir = Some(need(value)?),
        "dbpath" => globals.db_path = Some(need(value)?),
        "config" => globals.config_file = Some(need(value)?),
        "cachedir" => globals.cache_dirs.push(need(value)?),
        "logfile" => globals.log_file = Some(need(value)?),
        "gpgdir" => globals.gpg_dir = Some(need(value)?),
        "hookdir" => globals.hook_dirs.push(need(value)?),
        "arch" => globals.arch = Some(need(value)?),
        "sysroot" => globals.sysroot = Some(need(value)?),
        "ask" => {
            let v = need(value)?;
            globals.ask_mask = Some(v.parse().map_err(|_| ArgsError::MissingValue(name.to_string()))?);
        }
        "assume-installed" => globals.assume_installed.push(need(value)?),
        "overwrite" => globals.overwrite_globs.push(need(value)?),
        "noconfirm" => globals.no_confirm = true,
        "confirm" => globals.confirm = true,
        "debug" => globals.debug = true,
        "noprogressbar" => globals.no_progressbar = true,
        "print" => globals.print = true,
        "color" => {
            let v = need(value)?;
            globals.color = Some(match v.as_str() {
                "always" => ColorChoice::Always,
                "never" => ColorChoice::Never,
                _ => ColorChoice::Auto,
            });
        }
        "verbose" => globals.verbose = globals.verbose.saturating_add(1),
        _ => return Ok(false),
    }
    Ok(true)
}

fn apply_global_short(globals: &mut GlobalOptions, c: char) -> bool {
    match c {
        'v' => {
            globals.verbose = globals.verbose.saturating_add(1);
            true
        }
        _ => false,
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_op_long(
    op: OpLetter,
    name: &str,
    value: Option<&str>,
    remove: &mut RemoveOptions,
    upgrade: &mut UpgradeOptions,
    sync: &mut SyncOptions,
    query: &mut QueryOptions,
    files: &mut FilesOptions,
    database: &mut DatabaseOptions,
    deptest: &mut DepTestOptions,
) -> Result<bool, ArgsError> {
    match (op, name) {
        (OpLetter::Remove, "recursive") => remove.recursive = remove.recursive.saturating_add(1),
        (OpLetter::Remove, "nosave") => remove.nosave = true,
        (OpLetter::Remove, "cascade") => remove.cascade = true,
        (OpLetter::Remove, "unneeded") => remove.unneeded = true,
        (OpLetter::Remove, "nodeps") => remove.no_deps = remove.no_deps.saturating_add(1),
        (OpLetter::Upgrade, "nodeps") => upgrade.no_deps = upgrade.no_deps.saturating_add(1),
        (OpLetter::Upgrade, "force") => upgrade.force = true,
        (OpLetter::Upgrade, "downloadonly") => upgrade.download_only = true,
        (OpLetter::Upgrade, "asdeps") => upgrade.as_deps = true,
        (OpLetter::Upgrade, "asexplicit") => upgrade.as_explicit = true,
        (OpLetter::Sync, "clean") => sync.clean = sync.clean.saturating_add(1),
        (OpLetter::Sync, "refresh") => sync.refresh = sync.refresh.saturating_add(1),
        (OpLetter::Sync, "sysupgrade") => sync.sysupgrade = true,
        (OpLetter::Sync, "search") => sync.search = true,
        (OpLetter::Sync, "groups") => sync.groups = true,
        (OpLetter::Sync, "info") => sync.info = sync.info.saturating_add(1),
        (OpLetter::Sync, "list") => sync.list = true,
        (OpLetter::Sync, "downloadonly") => sync.download_only = true,
        (OpLetter::Sync, "print") => sync.print_uris = true,
        (OpLetter::Sync, "nodeps") => sync.no_deps = sync.no_deps.saturating_add(1),
        (OpLetter::Sync, "asdeps") => sync.as_deps = true,
        (OpLetter::Sync, "asexplicit") => sync.as_explicit = true,
        (OpLetter::Query, "search") => query.search = true,
        (OpLetter::Query, "groups") => query.groups = true,
        (OpLetter::Query, "info") => query.info = query.info.saturating_add(1),
        (OpLetter::Query, "list") => query.list = true,
        (OpLetter::Query, "owns") => query.owns = true,
        (OpLetter::Query, "foreign") => query.foreign = true,
        (OpLetter::Query, "unrequired") => query.unrequired = true,
        (OpLetter::Query, "file") => query.file = true,
        (OpLetter::Files, "owner") => files.owner = true,
        (OpLetter::Files, "search") => files.search = true,
        (OpLetter::Files, "list") => files.list = true,
        (OpLetter::Files, "refresh") => files.refresh = files.refresh.saturating_add(1),
        (OpLetter::Files, "machinereadable") => files.machine_readable = true,
        (OpLetter::Database, "asdeps") => database.as_deps = true,
        (OpLetter::Database, "asexplicit") => database.as_explicit = true,
        (OpLetter::DepTest, "vercmp") => deptest.vercmp = true,
        _ => return Ok(false),
    }
    Ok(true)
}

#[allow(clippy::too_many_arguments)]
fn apply_op_short(
    op: OpLetter,
    c: char,
    remove: &mut RemoveOptions,
    upgrade: &mut UpgradeOptions,
    sync: &mut SyncOptions,
    query: &mut QueryOptions,
    files: &mut FilesOptions,
    database: &mut DatabaseOptions,
    _deptest: &mut DepTestOptions,
) -> Result<(), ArgsError> {
    let handled = match op {
        OpLetter::Remove => match c {
            's' => {
                remove.recursive = remove.recursive.saturating_add(1);
                true
            }
            'n' => {
                remove.nosave = true;
                true
            }
            'c' => {
                remove.cascade = true;
                true
            }
            'u' => {
                remove.unneeded = true;
                true
            }
            'd' => {
                remove.no_deps = remove.no_deps.saturating_add(1);
                true
            }
            _ => false,
        },
        OpLetter::Upgrade => match c {
            'd' => {
                upgrade.no_deps = upgrade.no_deps.saturating_add(1);
                true
            }
            'f' => {
                upgrade.force = true;
                true
            }
            'w' => {
                upgrade.download_only = true;
                true
            }
            _ => false,
        },
        OpLetter::Sync => match c {
            'c' => {
                sync.clean = sync.clean.saturating_add(1);
                true
            }
            'y' => {
                sync.refresh = sync.refresh.saturating_add(1);
                true
            }
            'u' => {
                sync.sysupgrade = true;
                true
            }
            's' => {
                sync.search = true;
                true
            }
            'g' => {
                sync.groups = true;
                true
            }
            'i' => {
                sync.info = sync.info.saturating_add(1);
                true
            }
            'l' => {
                sync.list = true;
                true
            }
            'w' => {
                sync.download_only = true;
                true
            }
            'p' => {
                sync.print_uris = true;
                true
            }
            'd' => {
                sync.no_deps = sync.no_deps.saturating_add(1);
                true
            }
            _ => false,
        },
        OpLetter::Query => match c {
            's' => {
                query.search = true;
                true
            }
            'g' => {
                query.groups = true;
                true
            }
            'i' => {
                query.info = query.info.saturating_add(1);
                true
            }
            'l' => {
                query.list = true;
                true
            }
            'o' => {
                query.owns = true;
                true
            }
            'm' => {
                query.foreign = true;
                true
            }
            'e' => {
                query.unrequired = true;
                true
            }
            'p' => {
                query.file = true;
                true
            }
            _ => false,
        },
        OpLetter::Files => match c {
            'o' => {
                files.owner = true;
                true
            }
            's' => {
                files.search = true;
                true
            }
            'l' => {
                files.list = true;
                true
            }
            'y' => {
                files.refresh = files.refresh.saturating_add(1);
                true
            }
            _ => false,
        },
        OpLetter::Database => {
            let _ = &database;
            false
        }
        OpLetter::DepTest => false,
    };
    if handled {
        Ok(())
    } else {
        Err(ArgsError::UnknownOption(format!("-{c}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rejects_two_operations() {
        let err = parse(&argv(&["-S", "-R", "foo"])).unwrap_err();
        assert!(matches!(err, ArgsError::MultipleOperations));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn repeating_the_same_operation_is_fine() {
        let parsed = parse(&argv(&["-S", "-S", "-y", "-u"])).unwrap();
        match parsed.operation {
            Operation::Sync(s) => {
                assert_eq!(s.refresh, 1);
                assert!(s.sysupgrade);
            }
            _ => panic!("expected Sync"),
        }
    }

    #[test]
    fn sync_short_cluster_reinterprets_flags_under_sync_table() {
        let parsed = parse(&argv(&["-Syu", "--noconfirm"])).unwrap();
        assert!(parsed.globals.no_confirm);
        match parsed.operation {
            Operation::Sync(s) => {
                assert_eq!(s.refresh, 1);
                assert!(s.sysupgrade);
            }
            _ => panic!("expected Sync"),
        }
    }

    #[test]
    fn remove_s_means_recursive_not_search() {
        let parsed = parse(&argv(&["-Rs", "foo"])).unwrap();
        match parsed.operation {
            Operation::Remove(r) => assert_eq!(r.recursive, 1),
            _ => panic!("expected Remove"),
        }
        assert_eq!(parsed.targets, vec!["foo".to_string()]);
    }

    #[test]
    fn query_s_means_search_not_recursive() {
        let parsed = parse(&argv(&["-Qs", "pattern"])).unwrap();
        match parsed.operation {
            Operation::Query(q) => assert!(q.search),
            _ => panic!("expected Query"),
        }
    }

    #[test]
    fn help_wins_over_missing_operation() {
        let parsed = parse(&argv(&["-h"])).unwrap();
        assert!(matches!(parsed.operation, Operation::Help(None)));
    }

    #[test]
    fn help_after_operation_carries_the_operation() {
        let parsed = parse(&argv(&["-S", "-h"])).unwrap();
        assert!(matches!(parsed.operation, Operation::Help(Some(OpLetter::Sync))));
    }

    #[test]
    fn version_wins_over_everything() {
        let parsed = parse(&argv(&["-S", "-y", "-V"])).unwrap();
        assert!(matches!(parsed.operation, Operation::Version));
    }

    #[test]
    fn no_operation_is_an_error() {
        let err = parse(&argv(&["foo"])).unwrap_err();
        assert!(matches!(err, ArgsError::NoOperation));
    }

    #[test]
    fn unknown_short_flag_under_an_operation_is_rejected() {
        let err = parse(&argv(&["-D", "-s", "foo"])).unwrap_err();
        assert!(matches!(err, ArgsError::UnknownOption(_)));
    }

    #[test]
    fn long_options_and_equals_values_are_recognized() {
        let parsed = parse(&argv(&["-S", "--root=/mnt", "--dbpath", "/custom", "pkg"])).unwrap();
        assert_eq!(parsed.globals.root_dir.as_deref(), Some("/mnt"));
        assert_eq!(parsed.globals.db_path.as_deref(), Some("/custom"));
        assert_eq!(parsed.targets, vec!["pkg".to_string()]);
    }

    #[test]
    fn double_dash_stops_option_parsing() {
        let parsed = parse(&argv(&["-R", "--", "-s"])).unwrap();
        assert_eq!(parsed.targets, vec!["-s".to_string()]);
    }

    #[test]
    fn ask_mask_is_parsed_as_a_number() {
        let parsed = parse(&argv(&["-S", "--ask=4", "pkg"])).unwrap();
        assert_eq!(parsed.globals.ask_mask, Some(4));
    }

    #[test]
    fn assume_installed_and_overwrite_are_repeatable() {
        let parsed = parse(&argv(&[
            "-S",
            "--assume-installed",
            "foo=1.0",
            "--assume-installed",
            "bar=2.0",
            "--overwrite",
            "/etc/*",
            "pkg",
        ]))
        .unwrap();
        assert_eq!(parsed.globals.assume_installed, vec!["foo=1.0".to_string(), "bar=2.0".to_string()]);
        assert_eq!(parsed.globals.overwrite_globs, vec!["/etc/*".to_string()]);
    }
}
