//! Leveled output and interactive prompts (spec §4.2).

use crate::term::columns;
use pkgctl_core::{Level, QuestionKind};
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

static VERBOSE_LEVEL: AtomicU8 = AtomicU8::new(0);
static PADDING: AtomicBool = AtomicBool::new(false);

/// Set the active verbosity level (`-v`, repeatable). Gates `Debug` (level
/// >= 1) and `Function` (level >= 2) output.
pub fn set_verbose_level(level: u8) {
    VERBOSE_LEVEL.store(level, Ordering::Relaxed);
}

#[must_use]
pub fn verbose_level() -> u8 {
    VERBOSE_LEVEL.load(Ordering::Relaxed)
}

/// Enable or disable padding mode: output lines are right-padded to
/// `columns()` so a subsequent progress-bar redraw cleanly overwrites them
/// (spec §4.2).
pub fn set_output_padding(on: bool) {
    PADDING.store(on, Ordering::Relaxed);
}

fn is_level_enabled(level: Level) -> bool {
    match level {
        Level::Debug => verbose_level() >= 1,
        Level::Function => verbose_level() >= 2,
        Level::Error | Level::Warning | Level::Info => true,
    }
}

/// Print one leveled line. `Info` goes to stdout, everything else to stderr
/// (spec §4.2). Suppressed entirely when the level is gated off by
/// verbosity.
pub fn print(level: Level, message: &str) {
    if !is_level_enabled(level) {
        return;
    }
    let line = format!("{}{message}", level.prefix());
    let line = if PADDING.load(Ordering::Relaxed) {
        pad_to_columns(&line)
    } else {
        line
    };
    match level {
        Level::Info => {
            println!("{line}");
        }
        _ => {
            eprintln!("{line}");
        }
    }
}

fn pad_to_columns(line: &str) -> String {
    let width = crate::term::wcwidth(line);
    let cols = columns() as usize;
    if width >= cols {
        line.to_string()
    } else {
        format!("{line}{:width$}", "", width = cols - width)
    }
}

/// Shared decision for `no_confirm`/`ask_mask` prompts: `no_confirm` returns
/// the `default_yes` answer, XORed by a set bit in `ask_mask` for the
/// given `kind` (spec §4.2, §8 "yes/no defaults" property).
#[must_use]
pub fn preanswered(no_confirm: bool, ask_mask: u32, kind: Option<QuestionKind>, default_yes: bool) -> Option<bool> {
    if !no_confirm {
        return None;
    }
    let invert = kind.is_some_and(|k| ask_mask & k.bit() != 0);
    Some(default_yes ^ invert)
}

/// Read one line of interactive yes/no input and resolve it against
/// `default_yes`. Accepts (case-insensitively) `y`, `yes`, or an empty line
/// (which takes the default); anything else is `false` unless it starts
/// with the default's letter.
#[must_use]
pub fn resolve_yesno_line(line: &str, default_yes: bool) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return default_yes;
    }
    let lower = trimmed.to_lowercase();
    matches!(lower.as_str(), "y" | "yes")
}

/// Prompt for a yes/no answer. `no_confirm`/`ask_mask` bypass the prompt
/// entirely per `preanswered`.
pub fn yesno(
    prompt: &str,
    default_yes: bool,
    no_confirm: bool,
    ask_mask: u32,
    kind: Option<QuestionKind>,
) -> io::Result<bool> {
    if let Some(answer) = preanswered(no_confirm, ask_mask, kind, default_yes) {
        return Ok(answer);
    }
    let suffix = if default_yes { "[Y/n]" } else { "[y/N]" };
    eprint!("{prompt} {suffix} ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(resolve_yesno_line(&line, default_yes))
}

/// Prompt for a 1-based selection in `[1, count]`, re-prompting on invalid
/// input until a valid choice is read or EOF is hit (spec §4.2).
pub fn select_question(prompt: &str, count: usize) -> io::Result<usize> {
    let stdin = io::stdin();
    let mut locked = stdin.lock();
    loop {
        eprint!("{prompt} ");
        io::stderr().flush()?;
        let mut line = String::new();
        let read = locked.read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no selection made"));
        }
        if let Ok(n) = line.trim().parse::<usize>() {
            if n >= 1 && n <= count {
                return Ok(n);
            }
        }
        eprintln!("invalid value: {}", line.trim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preanswered_applies_ask_mask_inversion() {
        assert_eq!(preanswered(false, 0, None, true), None);
        assert_eq!(preanswered(true, 0, None, true), Some(true));
        assert_eq!(
            preanswered(true, QuestionKind::ReplacePkg.bit(), Some(QuestionKind::ReplacePkg), true),
            Some(false)
        );
        assert_eq!(
            preanswered(true, 0, Some(QuestionKind::ReplacePkg), true),
            Some(true)
        );
    }

    #[test]
    fn yesno_line_defaults_on_empty() {
        assert!(resolve_yesno_line("", true));
        assert!(!resolve_yesno_line("", false));
        assert!(resolve_yesno_line("y", false));
        assert!(resolve_yesno_line("YES", false));
        assert!(!resolve_yesno_line("n", true));
    }

    #[test]
    fn yesno_line_accepts_bare_newline_after_progress_bar() {
        // A bare "\n" read from stdin must resolve to the default, not be
        // treated as leftover state from a prior prompt (spec §4.2).
        assert!(resolve_yesno_line("\n", true));
    }
}
