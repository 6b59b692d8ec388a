//! Hierarchical INI configuration resolver (spec §4.3): streaming parse with
//! globbed recursive includes, bounded recursion and a callback protocol.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAX_RECURSION: u32 = 10;

/// Failure kinds from `parse` (spec §4.3).
#[derive(Debug, Error)]
pub enum IniError {
    #[error("config file {0} could not be read")]
    OpenFailed(PathBuf),

    #[error("config parsing exceeded max recursion depth of {MAX_RECURSION}")]
    MaxDepthExceeded,

    #[error("{file}, line {line}: bad section name")]
    BadSectionHeader { file: PathBuf, line: u32 },

    #[error("{file}, line {line}: syntax error - missing key")]
    MissingKey { file: PathBuf, line: u32 },

    #[error("{file}, line {line}: directive 'Include' needs a value")]
    IncludeNeedsValue { file: PathBuf, line: u32 },

    #[error("config callback rejected parsing with code {0}")]
    CallbackRejected(i32),
}

/// Parse `path` as a pacman-style INI file, invoking `callback` for every
/// section header, every directive, and once more at the very end of the
/// root file with all four fields `None` (spec §4.3).
///
/// The callback's return value aborts parsing immediately when non-zero,
/// becoming `IniError::CallbackRejected`.
pub fn parse<F>(path: &Path, callback: &mut F) -> Result<(), IniError>
where
    F: FnMut(Option<&Path>, u32, Option<&str>, Option<&str>, Option<&str>) -> i32,
{
    let mut section_name: Option<String> = None;
    parse_inner(path, callback, &mut section_name, 0)
}

fn parse_inner<F>(
    path: &Path,
    callback: &mut F,
    section_name: &mut Option<String>,
    depth: u32,
) -> Result<(), IniError>
where
    F: FnMut(Option<&Path>, u32, Option<&str>, Option<&str>, Option<&str>) -> i32,
{
    if depth >= MAX_RECURSION {
        return Err(IniError::MaxDepthExceeded);
    }

    tracing::debug!(file = %path.display(), depth, "config: attempting to read file");
    let file = File::open(path).map_err(|_| IniError::OpenFailed(path.to_path_buf()))?;
    let reader = BufReader::new(file);

    for (idx, line) in reader.lines().enumerate() {
        let lineno = (idx + 1) as u32;
        let raw = line.map_err(|_| IniError::OpenFailed(path.to_path_buf()))?;
        let without_comment = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw.as_str(),
        };
        let trimmed = without_comment.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            if trimmed.len() <= 2 {
                return Err(IniError::BadSectionHeader {
                    file: path.to_path_buf(),
                    line: lineno,
                });
            }
            let name = trimmed[1..trimmed.len() - 1].to_string();
            let ret = callback(Some(path), lineno, Some(&name), None, None);
            *section_name = Some(name);
            if ret != 0 {
                return Err(IniError::CallbackRejected(ret));
            }
            continue;
        }

        let (key, value) = match trimmed.split_once('=') {
            Some((k, v)) => (k.trim(), Some(v.trim())),
            None => (trimmed, None),
        };
        if key.is_empty() {
            return Err(IniError::MissingKey {
                file: path.to_path_buf(),
                line: lineno,
            });
        }

        if key.eq_ignore_ascii_case("include") {
            let Some(pattern) = value.filter(|v| !v.is_empty()) else {
                return Err(IniError::IncludeNeedsValue {
                    file: path.to_path_buf(),
                    line: lineno,
                });
            };
            expand_include(pattern, path, lineno, callback, section_name, depth)?;
            continue;
        }

        let ret = callback(Some(path), lineno, section_name.as_deref(), Some(key), value);
        if ret != 0 {
            return Err(IniError::CallbackRejected(ret));
        }
    }

    if depth == 0 {
        let ret = callback(None, 0, None, None, None);
        if ret != 0 {
            return Err(IniError::CallbackRejected(ret));
        }
    }

    tracing::debug!(file = %path.display(), "config: finished parsing");
    Ok(())
}

fn expand_include<F>(
    pattern: &str,
    file: &Path,
    lineno: u32,
    callback: &mut F,
    section_name: &mut Option<String>,
    depth: u32,
) -> Result<(), IniError>
where
    F: FnMut(Option<&Path>, u32, Option<&str>, Option<&str>, Option<&str>) -> i32,
{
    let resolved = resolve_glob(pattern, file);
    let options = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };
    let paths = match glob::glob_with(&resolved, options) {
        Ok(paths) => paths.filter_map(Result::ok).collect::<Vec<_>>(),
        Err(_) => Vec::new(),
    };

    if paths.is_empty() {
        // Glob-no-match is silently ignored (spec §4.3, §9): a debug log
        // only, never a parse error.
        tracing::debug!(file = %file.display(), line = lineno, pattern, "no include found");
        return Ok(());
    }

    let mut sorted = paths;
    sorted.sort();
    for included in sorted {
        parse_inner(&included, callback, section_name, depth + 1)?;
    }
    Ok(())
}

fn resolve_glob(pattern: &str, relative_to: &Path) -> String {
    let candidate = Path::new(pattern);
    if candidate.is_absolute() {
        return pattern.to_string();
    }
    match relative_to.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            parent.join(pattern).to_string_lossy().into_owned()
        }
        _ => pattern.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &str) {
        let mut f = File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[derive(Debug, Clone)]
    enum Call {
        Section(String),
        Directive(Option<String>, String, Option<String>),
        End,
    }

    #[test]
    fn basic_sections_and_directives() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pkgctl.conf");
        write(
            &path,
            "# comment\n[options]\nRootDir = /\n[core]\nServer = https://example.com\n",
        );

        let mut calls: Vec<Call> = Vec::new();
        parse(&path, &mut |_file, _line, section, key, value| {
            match (section, key, value) {
                (Some(s), None, None) => calls.push(Call::Section(s.to_string())),
                (s, Some(k), v) => calls.push(Call::Directive(
                    s.map(str::to_string),
                    k.to_string(),
                    v.map(str::to_string),
                )),
                (None, None, None) => calls.push(Call::End),
                _ => unreachable!(),
            }
            0
        })
        .unwrap();

        assert!(matches!(calls[0], Call::Section(ref s) if s == "options"));
        assert!(matches!(&calls[1], Call::Directive(Some(s), k, Some(v))
            if s == "options" && k == "RootDir" && v == "/"));
        assert!(matches!(calls.last().unwrap(), Call::End));
    }

    #[test]
    fn empty_section_name_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pkgctl.conf");
        write(&path, "[]\n");
        let err = parse(&path, &mut |_, _, _, _, _| 0).unwrap_err();
        assert!(matches!(err, IniError::BadSectionHeader { .. }));
    }

    #[test]
    fn include_needs_a_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pkgctl.conf");
        write(&path, "[options]\nInclude\n");
        let err = parse(&path, &mut |_, _, _, _, _| 0).unwrap_err();
        assert!(matches!(err, IniError::IncludeNeedsValue { .. }));
    }

    #[test]
    fn include_glob_no_match_is_not_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pkgctl.conf");
        write(&path, "[options]\nInclude = /nonexistent/*.conf\nRootDir = /\n");
        parse(&path, &mut |_, _, _, _, _| 0).unwrap();
    }

    #[test]
    fn recursion_depth_ten_succeeds_eleven_fails() {
        let dir = tempdir().unwrap();
        // Build a chain of 11 files: file0 includes file1 includes ... file10.
        let mut paths = Vec::new();
        for i in 0..11 {
            paths.push(dir.path().join(format!("f{i}.conf")));
        }
        write(&paths[10], "[options]\nRootDir = /\n");
        for i in (0..10).rev() {
            let next = paths[i + 1].to_string_lossy().into_owned();
            write(&paths[i], &format!("[options]\nInclude = {next}\n"));
        }

        // Chain of 10 files (f0..f9, depths 0..9) must succeed.
        let ten = dir.path().join("ten0.conf");
        write(&ten, "[options]\nRootDir = /\n");
        let mut chain = vec![ten.clone()];
        for i in 0..9 {
            let p = dir.path().join(format!("ten{}.conf", i + 1));
            write(&p, "[options]\nRootDir = /\n");
            chain.push(p);
        }
        // wire includes from ten9 backwards: ten0 -> ten1 -> ... -> ten9
        for i in (0..9).rev() {
            let next = chain[i + 1].to_string_lossy().into_owned();
            write(&chain[i], &format!("[options]\nInclude = {next}\n"));
        }
        parse(&chain[0], &mut |_, _, _, _, _| 0).unwrap();

        // Chain of 11 files must fail with MaxDepthExceeded.
        let err = parse(&paths[0], &mut |_, _, _, _, _| 0).unwrap_err();
        assert!(matches!(err, IniError::MaxDepthExceeded));
    }

    #[test]
    fn nonzero_callback_return_aborts_parsing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pkgctl.conf");
        write(&path, "[options]\nRootDir = /\nBadKey = x\n");
        let err = parse(&path, &mut |_, _, _, key, _| {
            if key == Some("BadKey") {
                42
            } else {
                0
            }
        })
        .unwrap_err();
        assert!(matches!(err, IniError::CallbackRejected(42)));
    }
}
