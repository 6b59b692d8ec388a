//! The typed configuration model (spec §3 `Config`, §4.4) built from the
//! INI resolver's callback stream.

use crate::ini::{self, IniError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A repository section (spec §3).
#[derive(Debug, Clone, Default)]
pub struct Repository {
    pub name: String,
    pub servers: Vec<String>,
    pub siglevel: Vec<String>,
    pub usage: u32,
}

pub const USAGE_SYNC: u32 = 1 << 0;
pub const USAGE_SEARCH: u32 = 1 << 1;
pub const USAGE_INSTALL: u32 = 1 << 2;
pub const USAGE_UPGRADE: u32 = 1 << 3;
pub const USAGE_ALL: u32 = USAGE_SYNC | USAGE_SEARCH | USAGE_INSTALL | USAGE_UPGRADE;

/// Process-wide configuration (spec §3). Built once by `Config::load`, then
/// read-only for the remainder of the operation.
#[derive(Debug, Clone)]
pub struct Config {
    pub root_dir: String,
    pub db_path: String,
    pub cache_dirs: Vec<String>,
    pub log_file: Option<String>,
    pub gpg_dir: String,
    pub hook_dirs: Vec<String>,
    pub architecture: Option<String>,
    pub xfer_command: Option<String>,
    pub clean_method: Vec<String>,
    pub use_syslog: bool,
    pub color_mode: ColorMode,
    pub no_progressbar: bool,
    pub chomp: bool,
    pub verbose_level: u8,
    pub disable_download_timeout: bool,
    pub parallel_downloads: u32,
    pub no_confirm: bool,
    pub ask_mask: u32,
    pub check_space: bool,
    pub hold_pkg: Vec<String>,
    pub ignore_pkg: Vec<String>,
    pub ignore_group: Vec<String>,
    pub no_upgrade: Vec<String>,
    pub no_extract: Vec<String>,
    pub siglevel: Vec<String>,
    pub local_file_siglevel: Vec<String>,
    pub remote_file_siglevel: Vec<String>,
    // SPEC_FULL §3 supplement.
    pub print_uris: bool,
    pub download_only: bool,
    pub no_deps_level: u8,
    pub assume_installed: Vec<String>,
    pub overwrite_globs: Vec<String>,
    pub sysroot: Option<PathBuf>,
    pub repositories: Vec<Repository>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: "/".to_string(),
            db_path: "/var/lib/pacman/".to_string(),
            cache_dirs: Vec::new(),
            log_file: None,
            gpg_dir: "/etc/pacman.d/gnupg/".to_string(),
            hook_dirs: Vec::new(),
            architecture: None,
            xfer_command: None,
            clean_method: Vec::new(),
            use_syslog: false,
            color_mode: ColorMode::Auto,
            no_progressbar: false,
            chomp: false,
            verbose_level: 0,
            disable_download_timeout: false,
            parallel_downloads: 1,
            no_confirm: false,
            ask_mask: 0,
            check_space: false,
            hold_pkg: Vec::new(),
            ignore_pkg: Vec::new(),
            ignore_group: Vec::new(),
            no_upgrade: Vec::new(),
            no_extract: Vec::new(),
            siglevel: Vec::new(),
            local_file_siglevel: Vec::new(),
            remote_file_siglevel: Vec::new(),
            print_uris: false,
            download_only: false,
            no_deps_level: 0,
            assume_installed: Vec::new(),
            overwrite_globs: Vec::new(),
            sysroot: None,
            repositories: Vec::new(),
        }
    }
}

/// Errors raised while resolving the configuration (spec §7.1).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not open configuration: {0}")]
    Open(#[from] IniError),

    #[error("{0}, line {1}: {2}")]
    Syntax(PathBuf, u32, String),

    #[error("repository name 'local' is reserved")]
    Reserved,

    #[error("more than one [options] section is not allowed")]
    DuplicateOptions,
}

impl Config {
    /// Load and merge a configuration file through the C3 INI resolver
    /// (spec §4.3, §4.4).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        let mut builder = ConfigBuilder::new(&mut config);
        let mut rejected: Option<ConfigError> = None;

        let result = ini::parse(path, &mut |file, line, section, key, value| {
            match builder.directive(file, line, section, key, value) {
                Ok(()) => 0,
                Err(err) => {
                    rejected = Some(err);
                    1
                }
            }
        });

        if let Some(err) = rejected {
            return Err(err);
        }
        result?;
        builder.finish();
        Ok(config)
    }
}

/// Threads INI callback invocations into `Config` mutations, matching the
/// directive table in spec §4.4.
struct ConfigBuilder<'a> {
    config: &'a mut Config,
    saw_options_section: bool,
    current_repo: Option<usize>,
}

impl<'a> ConfigBuilder<'a> {
    fn new(config: &'a mut Config) -> Self {
        Self {
            config,
            saw_options_section: false,
            current_repo: None,
        }
    }

    fn directive(
        &mut self,
        _file: Option<&Path>,
        line: u32,
        section: Option<&str>,
        key: Option<&str>,
        value: Option<&str>,
    ) -> Result<(), ConfigError> {
        let Some(key) = key else {
            // section-start or end-of-file marker; section switches are
            // handled implicitly since every directive already carries its
            // owning section name.
            if let Some(section) = section {
                self.enter_section(section)?;
            }
            return Ok(());
        };
        match section {
            None => Err(ConfigError::Syntax(
                PathBuf::new(),
                line,
                format!("directive '{key}' outside any section"),
            )),
            Some("options") => self.options_directive(key, value, line),
            Some(_) => self.repo_directive(key, value, line),
        }
    }

    fn enter_section(&mut self, name: &str) -> Result<(), ConfigError> {
        if name == "options" {
            if self.saw_options_section {
                return Err(ConfigError::DuplicateOptions);
            }
            self.saw_options_section = true;
            self.current_repo = None;
            return Ok(());
        }
        if name == "local" {
            return Err(ConfigError::Reserved);
        }
        let idx = self
            .config
            .repositories
            .iter()
            .position(|r| r.name == name)
            .unwrap_or_else(|| {
                self.config.repositories.push(Repository {
                    name: name.to_string(),
                    ..Repository::default()
                });
                self.config.repositories.len() - 1
            });
        self.current_repo = Some(idx);
        Ok(())
    }

    fn options_directive(
        &mut self,
        key: &str,
        value: Option<&str>,
        line: u32,
    ) -> Result<(), ConfigError> {
        let c = &mut self.config;
        match key {
            "RootDir" => c.root_dir = require_value(value, key, line)?,
            "DBPath" => c.db_path = require_value(value, key, line)?,
            "CacheDir" => c.cache_dirs.push(require_value(value, key, line)?),
            "LogFile" => c.log_file = Some(require_value(value, key, line)?),
            "GPGDir" => c.gpg_dir = require_value(value, key, line)?,
            "HookDir" => c.hook_dirs.push(require_value(value, key, line)?),
            "Architecture" => {
                let v = require_value(value, key, line)?;
                c.architecture = if v == "auto" { None } else { Some(v) };
            }
            "XferCommand" => c.xfer_command = Some(require_value(value, key, line)?),
            "CleanMethod" => c.clean_method = split_list(value),
            "UseSyslog" => c.use_syslog = true,
            "Color" => c.color_mode = ColorMode::Always,
            "NoProgressBar" => c.no_progressbar = true,
            "CheckSpace" => c.check_space = true,
            "ILoveCandy" => c.chomp = true,
            "VerbosePkgLists" => {}
            "DisableDownloadTimeout" => c.disable_download_timeout = true,
            "ParallelDownloads" => {
                let v = require_value(value, key, line)?;
                let n: u32 = v.parse().map_err(|_| {
                    ConfigError::Syntax(PathBuf::new(), line, format!("invalid ParallelDownloads: {v}"))
                })?;
                if n == 0 {
                    return Err(ConfigError::Syntax(
                        PathBuf::new(),
                        line,
                        "ParallelDownloads must be >= 1".to_string(),
                    ));
                }
                c.parallel_downloads = n;
            }
            "SigLevel" => c.siglevel = split_list(value),
            "LocalFileSigLevel" => c.local_file_siglevel = split_list(value),
            "RemoteFileSigLevel" => c.remote_file_siglevel = split_list(value),
            "HoldPkg" => c.hold_pkg.extend(split_list(value)),
            "IgnorePkg" => c.ignore_pkg.extend(split_list(value)),
            "IgnoreGroup" => c.ignore_group.extend(split_list(value)),
            "NoUpgrade" => c.no_upgrade.extend(split_list(value)),
            "NoExtract" => c.no_extract.extend(split_list(value)),
            "Server" => {
                return Err(ConfigError::Syntax(
                    PathBuf::new(),
                    line,
                    "Server directive is not valid in the [options] section".to_string(),
                ));
            }
            _ => {
                tracing::debug!(key, "unrecognized options directive, ignoring");
            }
        }
        Ok(())
    }

    fn repo_directive(&mut self, key: &str, value: Option<&str>, line: u32) -> Result<(), ConfigError> {
        let Some(idx) = self.current_repo else {
            return Err(ConfigError::Syntax(
                PathBuf::new(),
                line,
                "directive outside any repository section".to_string(),
            ));
        };
        let repo = &mut self.config.repositories[idx];
        match key {
            "Server" => repo.servers.push(require_value(value, key, line)?),
            "SigLevel" => repo.siglevel = split_list(value),
            "Usage" => {
                repo.usage = split_list(value).iter().fold(0, |acc, tok| {
                    acc | match tok.as_str() {
                        "Sync" => USAGE_SYNC,
                        "Search" => USAGE_SEARCH,
                        "Install" => USAGE_INSTALL,
                        "Upgrade" => USAGE_UPGRADE,
                        "All" => USAGE_ALL,
                        _ => 0,
                    }
                });
            }
            _ => {
                tracing::debug!(key, "unrecognized repository directive, ignoring");
            }
        }
        Ok(())
    }

    fn finish(self) {
        for repo in &mut self.config.repositories {
            if repo.usage == 0 {
                repo.usage = USAGE_ALL;
            }
        }
    }
}

fn require_value(value: Option<&str>, key: &str, line: u32) -> Result<String, ConfigError> {
    value
        .map(str::to_string)
        .ok_or_else(|| ConfigError::Syntax(PathBuf::new(), line, format!("'{key}' requires a value")))
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or("")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &str) {
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn parses_options_and_repositories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pkgctl.conf");
        write(
            &path,
            "[options]\nRootDir = /\nParallelDownloads = 4\nIgnorePkg = foo bar\n\n[core]\nServer = https://mirror/$repo/$arch\nSigLevel = Required\n",
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.root_dir, "/");
        assert_eq!(config.parallel_downloads, 4);
        assert_eq!(config.ignore_pkg, vec!["foo", "bar"]);
        assert_eq!(config.repositories.len(), 1);
        assert_eq!(config.repositories[0].name, "core");
        assert_eq!(config.repositories[0].servers.len(), 1);
    }

    #[test]
    fn rejects_local_repo_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pkgctl.conf");
        write(&path, "[local]\nServer = https://example.com\n");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Reserved));
    }

    #[test]
    fn rejects_zero_parallel_downloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pkgctl.conf");
        write(&path, "[options]\nParallelDownloads = 0\n");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn rejects_server_in_options_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pkgctl.conf");
        write(&path, "[options]\nServer = https://example.com\n");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn rejects_duplicate_options_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pkgctl.conf");
        write(&path, "[options]\nRootDir = /\n[options]\nDBPath = /var/lib/x/\n");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateOptions));
    }
}
