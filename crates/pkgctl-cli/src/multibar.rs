//! Multi-line download progress UI (spec §4.7): an ordered set of active
//! progress bars tracked by a single cursor line, with smoothed rate
//! estimation, reorder-on-completion and extension-trimmed filenames.

use crate::term;
use pkgctl_core::DownloadResult;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

const RATE_LIMIT: Duration = Duration::from_millis(200);
const STRIPPED_EXTENSIONS: &[&str] = &[".pkg.tar.zst", ".pkg.tar.xz", ".pkg", ".db", ".files"];

#[derive(Debug, Clone)]
struct ProgressBar {
    filename: String,
    xfered: u64,
    total_size: u64,
    init_time: Instant,
    sync_time: Instant,
    rate: f64,
    completed: bool,
}

impl ProgressBar {
    fn new(filename: String, now: Instant) -> Self {
        Self {
            filename,
            xfered: 0,
            total_size: 0,
            init_time: now,
            sync_time: now,
            rate: 0.0,
            completed: false,
        }
    }
}

/// `bars[0]` is always the line closest to the cursor's rest position
/// (spec §3 `MultibarState`).
#[derive(Debug)]
pub struct MultibarState {
    bars: Vec<ProgressBar>,
    cursor_line: u16,
    move_completed_up: bool,
    chomp: bool,
    enabled: bool,
}

impl MultibarState {
    #[must_use]
    pub fn new(enabled: bool, move_completed_up: bool, chomp: bool) -> Self {
        Self {
            bars: Vec::new(),
            cursor_line: 0,
            move_completed_up,
            chomp,
            enabled,
        }
    }

    #[cfg(test)]
    fn bar_names(&self) -> Vec<&str> {
        self.bars.iter().map(|b| b.filename.as_str()).collect()
    }

    #[cfg(test)]
    fn cursor_line(&self) -> u16 {
        self.cursor_line
    }

    fn disabled(&self) -> bool {
        !self.enabled || term::columns() == 0
    }

    pub fn init(&mut self, filename: &str) {
        if self.disabled() {
            eprintln!("{filename} downloading...");
            return;
        }
        term::cursor_move_down(u16::try_from(self.bars.len()).unwrap_or(u16::MAX) - self.cursor_line);
        eprintln!("{filename} downloading...");
        self.bars.push(ProgressBar::new(filename.to_string(), Instant::now()));
        self.cursor_line = u16::try_from(self.bars.len()).unwrap_or(u16::MAX);
    }

    pub fn progress(&mut self, filename: &str, downloaded: u64, total: u64) {
        if self.disabled() {
            return;
        }
        let now = Instant::now();
        let Some(idx) = self.bars.iter().position(|b| b.filename == filename) else {
            return;
        };
        if now.duration_since(self.bars[idx].sync_time) < RATE_LIMIT {
            return;
        }
        self.update_unthrottled(idx, downloaded, total, now);
    }

    fn update_unthrottled(&mut self, idx: usize, downloaded: u64, total: u64, now: Instant) {
        let bar = &mut self.bars[idx];
        let dt = now.duration_since(bar.sync_time).as_secs_f64().max(0.001);
        let last_chunk_rate = (downloaded.saturating_sub(bar.xfered)) as f64 / dt;
        bar.rate = ewma_rate(bar.rate, last_chunk_rate);
        bar.xfered = downloaded;
        bar.total_size = total;
        bar.sync_time = now;
        self.redraw_line(idx);
    }

    pub fn complete(&mut self, filename: &str, result: DownloadResult) {
        if self.disabled() {
            if result == DownloadResult::UpToDate {
                eprintln!("{filename} is up to date");
            }
            return;
        }
        let Some(mut idx) = self.bars.iter().position(|b| b.filename == filename) else {
            return;
        };
        self.bars[idx].completed = true;

        match result {
            DownloadResult::UpToDate => {
                self.move_to_line(idx);
                eprint!("{filename} is up to date");
                term::erase_line();
                eprintln!();
            }
            DownloadResult::Failed => {
                self.move_to_line(idx);
                eprintln!("{filename} failed to download");
            }
            DownloadResult::Ok => {
                let now = Instant::now();
                let elapsed = now.duration_since(self.bars[idx].init_time).as_secs_f64().max(0.001);
                self.bars[idx].rate = self.bars[idx].xfered as f64 / elapsed;
                if self.move_completed_up && idx != 0 {
                    self.bars.swap(0, idx);
                    self.redraw_line(idx);
                    idx = 0;
                }
                self.move_to_line(idx);
                self.redraw_line(idx);
            }
        }

        self.trim_completed_head();
    }

    fn trim_completed_head(&mut self) {
        while self.bars.first().is_some_and(|b| b.completed) {
            self.bars.remove(0);
            self.cursor_line = self.cursor_line.saturating_sub(1);
        }
    }

    fn move_to_line(&mut self, idx: usize) {
        let target = u16::try_from(idx).unwrap_or(u16::MAX);
        if target < self.cursor_line {
            term::cursor_move_up(self.cursor_line - target);
        } else if target > self.cursor_line {
            term::cursor_move_down(target - self.cursor_line);
        }
        self.cursor_line = target;
    }

    fn redraw_line(&self, idx: usize) {
        let Some(bar) = self.bars.get(idx) else { return };
        term::erase_line();
        eprint!("{}", render_bar(bar, self.chomp));
    }
}

/// `rate = (last_chunk_rate + 2*rate) / 3` (spec §4.7), confirmed against
/// the legacy download-progress smoothing constant.
fn ewma_rate(prev_rate: f64, last_chunk_rate: f64) -> f64 {
    (last_chunk_rate + 2.0 * prev_rate) / 3.0
}

fn strip_known_extension(name: &str) -> &str {
    for ext in STRIPPED_EXTENSIONS {
        if let Some(stripped) = name.strip_suffix(ext) {
            return stripped;
        }
    }
    name
}

fn format_eta(rate: f64, remaining: u64) -> String {
    if rate <= 0.0 {
        return "--:--".to_string();
    }
    let seconds = (remaining as f64 / rate).round() as u64;
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h == 0 {
        format!("{m:02}:{s:02}")
    } else if h < 100 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        "--:--".to_string()
    }
}

fn format_rate(rate: f64) -> String {
    let (value, unit) = term::humanize_size(rate as i64, 2);
    format!("{value:.2} {unit}/s")
}

fn percent(bar: &ProgressBar) -> u32 {
    if bar.total_size == 0 {
        0
    } else {
        ((bar.xfered as f64 / bar.total_size as f64) * 100.0).round() as u32
    }
}

fn render_bar(bar: &ProgressBar, chomp: bool) -> String {
    let cols = term::columns() as usize;
    let infolen = (cols * 6 / 10).max(50).min(cols.max(1));
    let name = strip_known_extension(&bar.filename);
    let name_col = term::truncate_to_width(name, infolen.saturating_sub(1));

    let (xfered_val, xfered_unit) = term::humanize_size(bar.xfered as i64, 1);
    let size_col = format!("{xfered_val:.1} {xfered_unit}");
    let rate_col = format_rate(bar.rate);
    let remaining = bar.total_size.saturating_sub(bar.xfered);
    let eta_col = format_eta(bar.rate, remaining);
    let pct = percent(bar);

    let bar_width = cols.saturating_sub(infolen).max(10);
    let filled = (bar_width * pct as usize / 100).min(bar_width);
    let fill_char = if chomp { 'C' } else { '#' };
    let fill: String = std::iter::repeat(fill_char)
        .take(filled)
        .chain(std::iter::repeat('-').take(bar_width - filled))
        .collect();

    let label_width = UnicodeWidthStr::width(name_col.as_str());
    let pad = infolen.saturating_sub(label_width + 1);
    format!("{name_col}{:pad$} {size_col} {rate_col} {eta_col} [{fill}] {pct:3}%", "", pad = pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_converges_to_constant_rate_within_five_percent() {
        let true_rate = 1_000_000.0;
        let mut rate = 0.0;
        for _ in 0..5 {
            rate = ewma_rate(rate, true_rate);
        }
        assert!((rate - true_rate).abs() / true_rate < 0.05, "rate={rate}");
    }

    #[test]
    fn init_and_complete_keep_cursor_line_in_bounds() {
        let mut m = MultibarState::new(true, true, false);
        m.init("a.pkg.tar.zst");
        m.init("b.pkg.tar.zst");
        assert!(m.cursor_line() as usize <= m.bars.len());
        m.complete("a.pkg.tar.zst", DownloadResult::Ok);
        assert!(m.cursor_line() as usize <= m.bars.len());
        m.complete("b.pkg.tar.zst", DownloadResult::Ok);
        assert!(m.bars.is_empty());
        assert_eq!(m.cursor_line(), 0);
    }

    #[test]
    fn completed_head_is_trimmed_and_never_redrawn() {
        let mut m = MultibarState::new(true, false, false);
        m.init("first");
        m.init("second");
        m.complete("first", DownloadResult::Ok);
        assert_eq!(m.bar_names(), vec!["second"]);
    }

    #[test]
    fn noncompleted_bar_stays_at_head_until_earlier_bars_finish() {
        let mut m = MultibarState::new(true, false, false);
        m.init("first");
        m.init("second");
        m.complete("second", DownloadResult::Ok);
        // first is still active: second must linger, not be trimmed.
        assert_eq!(m.bar_names(), vec!["first", "second"]);
        m.complete("first", DownloadResult::Ok);
        assert!(m.bars.is_empty());
    }

    #[test]
    fn strips_known_extensions() {
        assert_eq!(strip_known_extension("foo.pkg.tar.zst"), "foo");
        assert_eq!(strip_known_extension("core.db"), "core");
        assert_eq!(strip_known_extension("plain"), "plain");
    }

    #[test]
    fn eta_falls_back_to_placeholder_when_rate_is_zero() {
        assert_eq!(format_eta(0.0, 100), "--:--");
    }

    #[test]
    fn eta_switches_format_past_one_hour() {
        assert_eq!(format_eta(1.0, 30), "00:30");
        assert_eq!(format_eta(1.0, 3700), "01:01:40");
    }
}
