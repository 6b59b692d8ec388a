//! Terminal primitives (spec §4.1): column width, cursor movement, wide-char
//! width and humanized byte sizes.
//!
//! Cursor movement is queued through `crossterm`, matching the teacher's
//! `ui/engine.rs` pattern of batching commands and flushing once rather than
//! issuing one syscall per movement.

use crossterm::terminal;
use crossterm::{cursor, queue, terminal::ClearType};
use std::io::{self, Write};
use std::sync::atomic::{AtomicU16, Ordering};
use unicode_width::UnicodeWidthStr;

const DEFAULT_COLUMNS: u16 = 80;

/// 0 means "not yet cached"; real terminal widths are never 0.
static COLUMN_CACHE: AtomicU16 = AtomicU16::new(0);

/// Current terminal width. Queries the OS the first time (or after
/// `column_cache_reset`), then returns the cached value. Returns
/// `DEFAULT_COLUMNS` when not attached to a terminal.
#[must_use]
pub fn columns() -> u16 {
    let cached = COLUMN_CACHE.load(Ordering::Relaxed);
    if cached != 0 {
        return cached;
    }
    let cols = terminal::size().map(|(w, _)| w).unwrap_or(DEFAULT_COLUMNS);
    let cols = if cols == 0 { DEFAULT_COLUMNS } else { cols };
    COLUMN_CACHE.store(cols, Ordering::Relaxed);
    cols
}

/// Invalidate the cached column width. Called on `SIGWINCH` (spec §5).
pub fn column_cache_reset() {
    COLUMN_CACHE.store(0, Ordering::Relaxed);
}

/// Move the cursor up `n` lines. No-op for `n == 0`.
pub fn cursor_move_up(n: u16) {
    if n == 0 {
        return;
    }
    let mut out = io::stdout();
    let _ = queue!(out, cursor::MoveUp(n));
    let _ = out.flush();
}

/// Move the cursor down `n` lines. No-op for `n == 0`.
pub fn cursor_move_down(n: u16) {
    if n == 0 {
        return;
    }
    let mut out = io::stdout();
    let _ = queue!(out, cursor::MoveDown(n));
    let _ = out.flush();
}

/// Erase the current line from the cursor's column to its end.
pub fn erase_line() {
    let mut out = io::stdout();
    let _ = queue!(out, terminal::Clear(ClearType::UntilNewLine));
    let _ = out.flush();
}

/// Display width of `s`, counting wide CJK glyphs as 2 columns. Falls back to
/// the code point count for control characters that have no display width
/// (spec §9 "document the limitation" when a column-width primitive is
/// unavailable for a given character).
#[must_use]
pub fn wcwidth(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate `s` to fit within `max_width` display columns, appending an
/// ellipsis when truncation was necessary. Operates on display width, not
/// byte length (spec §4.6, §9).
#[must_use]
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if wcwidth(s) <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    if max_width <= 1 {
        return ".".repeat(max_width);
    }
    let budget = max_width - 1;
    let mut out = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let w = UnicodeWidthStr::width(ch.encode_utf8(&mut [0; 4]) as &str);
        if width + w > budget {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push('…');
    out
}

/// Unit labels for `humanize_size`, smallest to largest.
const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];

/// Pick the largest unit such that the mantissa lies in `[1, 1024)`, rounded
/// to `precision` decimal digits. Values below 1 KiB are reported in bytes.
#[must_use]
pub fn humanize_size(bytes: i64, precision: usize) -> (f64, &'static str) {
    let negative = bytes < 0;
    let mut value = bytes.unsigned_abs() as f64;
    let mut unit_idx = 0;
    while value >= 1024.0 && unit_idx < UNITS.len() - 1 {
        value /= 1024.0;
        unit_idx += 1;
    }
    let scale = 10f64.powi(precision as i32);
    let rounded = (value * scale).round() / scale;
    // Rounding up at the boundary (e.g. 1023.96 -> 1024.0) bumps a unit.
    let (rounded, unit_idx) = if rounded >= 1024.0 && unit_idx < UNITS.len() - 1 {
        (rounded / 1024.0, unit_idx + 1)
    } else {
        (rounded, unit_idx)
    };
    let signed = if negative { -rounded } else { rounded };
    (signed, UNITS[unit_idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanize_picks_unit_by_mantissa_range() {
        assert_eq!(humanize_size(512, 1), (512.0, "B"));
        assert_eq!(humanize_size(1024, 1), (1.0, "KiB"));
        assert_eq!(humanize_size(1024 * 1024, 2), (1.0, "MiB"));
        let (v, u) = humanize_size(1536, 1);
        assert_eq!(u, "KiB");
        assert!((v - 1.5).abs() < 0.01);
    }

    #[test]
    fn humanize_negative_preserves_sign() {
        let (v, u) = humanize_size(-2048, 0);
        assert_eq!(u, "KiB");
        assert!(v < 0.0);
    }

    #[test]
    fn truncate_counts_display_width_not_bytes() {
        let s = "readme-long-filename.pkg.tar.zst";
        let truncated = truncate_to_width(s, 10);
        assert!(wcwidth(&truncated) <= 10);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn truncate_noop_when_it_fits() {
        assert_eq!(truncate_to_width("short", 20), "short");
    }
}
