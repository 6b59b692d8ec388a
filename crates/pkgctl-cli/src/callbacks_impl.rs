//! Concrete `Callbacks` implementation handed to the back-end (spec §4.6,
//! §9 "collect global mutable state into one driver context").
//!
//! All callback side effects — cursor movement, multibar state, delayed-log
//! queue, stdout/stderr writes — are serialized through one `Mutex` rather
//! than the teacher's actor/mpsc-channel pattern: the back-end calls these
//! functions synchronously and possibly re-entrantly from its own worker
//! threads, so there is no event loop to hand work off to (SPEC_FULL.md C6).

use crate::config::Config;
use crate::multibar::MultibarState;
use crate::output;
use crate::term;
use pkgctl_core::{Answer, Callbacks, DownloadEvent, Event, Level, PackageOp, ProgressEvent, Question, QuestionPayload};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

const PROGRESS_RATE_LIMIT: Duration = Duration::from_millis(200);

struct DriverState {
    multibar: MultibarState,
    delayed_log: Vec<(Level, String)>,
    on_progress: bool,
    last_progress_current: usize,
    last_progress_draw: Option<Instant>,
}

/// The single driver context threaded into the back-end, per spec §9.
pub struct DriverCallbacks {
    state: Mutex<DriverState>,
    no_confirm: bool,
    ask_mask: u32,
}

impl DriverCallbacks {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            state: Mutex::new(DriverState {
                multibar: MultibarState::new(!config.no_progressbar, true, config.chomp),
                delayed_log: Vec::new(),
                on_progress: false,
                last_progress_current: 0,
                last_progress_draw: None,
            }),
            no_confirm: config.no_confirm,
            ask_mask: config.ask_mask,
        }
    }

    /// Move past the progress bar, flush whatever log lines queued up while
    /// it was active, and clear `on_progress` (spec §4.6).
    fn end_progress_window(&self, state: &mut DriverState) {
        if !state.on_progress {
            return;
        }
        state.on_progress = false;
        if !state.delayed_log.is_empty() {
            eprintln!();
            for (level, message) in state.delayed_log.drain(..) {
                output::print(level, &message);
            }
        }
    }
}

impl Callbacks for DriverCallbacks {
    fn log(&self, level: Level, message: &str) {
        let mut state = self.state.lock().unwrap();
        if state.on_progress {
            state.delayed_log.push((level, message.to_string()));
        } else {
            drop(state);
            output::print(level, message);
        }
    }

    fn event(&self, event: &Event) {
        let mut state = self.state.lock().unwrap();
        if event.starts_progress() {
            state.on_progress = true;
        }
        if event.ends_progress() {
            self.end_progress_window(&mut state);
        }
        drop(state);

        match event {
            Event::PackageOperationDone(info) => {
                let verb = match info.op {
                    PackageOp::Install => "installed",
                    PackageOp::Upgrade => "upgraded",
                    PackageOp::Reinstall => "reinstalled",
                    PackageOp::Downgrade => "downgraded",
                    PackageOp::Remove => "removed",
                };
                if !matches!(info.op, PackageOp::Remove) && !info.new_optdepends.is_empty() {
                    output::print(
                        Level::Info,
                        &format!(
                            "{} ({}) optional dependencies:\n    {}",
                            info.target,
                            verb,
                            info.new_optdepends.join("\n    ")
                        ),
                    );
                }
            }
            Event::DatabaseMissing { repo } => {
                output::print(Level::Warning, &format!("database file for '{repo}' does not exist"));
            }
            Event::PacnewCreated { path } => {
                output::print(Level::Warning, &format!("{path} installed as {path}.pacnew"));
            }
            Event::PacsaveCreated { path } => {
                output::print(Level::Warning, &format!("{path} saved as {path}.pacsave"));
            }
            Event::OptdepRemoval { target, optdep } => {
                output::print(Level::Info, &format!("{target} optionally requires {optdep}"));
            }
            Event::ScriptletInfo { line } => {
                output::print(Level::Info, line);
            }
            _ => {}
        }
    }

    fn question(&self, question: &mut Question) {
        let kind = question.payload.kind();
        let default_yes = kind.default_yes();

        if let QuestionPayload::SelectProvider { providers, .. } = &question.payload {
            let answer = if self.no_confirm {
                0
            } else {
                let prompt = providers
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("{}) {p}", i + 1))
                    .collect::<Vec<_>>()
                    .join("\n");
                eprintln!("{prompt}");
                output::select_question("Enter a number:", providers.len())
                    .map(|n| n - 1)
                    .unwrap_or(0)
            };
            question.answer = Some(Answer::ProviderIndex(answer));
            return;
        }

        if let Some(answer) = output::preanswered(self.no_confirm, self.ask_mask, Some(kind), default_yes) {
            question.answer = Some(Answer::Bool(answer));
            return;
        }

        let prompt = match &question.payload {
            QuestionPayload::InstallIgnorePkg { package } => {
                format!(":: {package} is in IgnorePkg/IgnoreGroup. Install anyway?")
            }
            QuestionPayload::ReplacePkg { old, new, repo } => {
                format!(":: Replace {old} with {repo}/{new}?")
            }
            QuestionPayload::ConflictPkg { target, conflicting } => {
                format!(":: {target} conflicts with {conflicting}. Remove {conflicting}?")
            }
            QuestionPayload::RemovePkgs { packages } => {
                format!(":: The following packages should be removed:\n    {}\nDo you want to remove these packages?", packages.join(" "))
            }
            QuestionPayload::CorruptedPkg { path } => {
                format!(":: {path} is corrupted. Do you want to delete it?")
            }
            QuestionPayload::ImportKey { keyid, uid } => {
                format!(":: Import PGP key {keyid}, \"{uid}\"?")
            }
            QuestionPayload::SelectProvider { .. } => unreachable!(),
        };
        let answer = output::yesno(&prompt, default_yes, self.no_confirm, self.ask_mask, Some(kind)).unwrap_or(default_yes);
        question.answer = Some(Answer::Bool(answer));
    }

    fn progress(&self, event: ProgressEvent, pkg_name: &str, percent: u8, howmany: usize, current: usize) {
        let mut state = self.state.lock().unwrap();
        let now = Instant::now();
        let advanced = current != state.last_progress_current;
        let boundary = percent == 0 || percent == 100;
        if !advanced && !boundary {
            if let Some(last) = state.last_progress_draw {
                if now.duration_since(last) < PROGRESS_RATE_LIMIT {
                    return;
                }
            }
        }
        state.last_progress_current = current;
        state.last_progress_draw = Some(now);
        state.on_progress = true;

        let cols = term::columns() as usize;
        let infolen = (cols * 6 / 10).max(50).min(cols.max(1));
        let label = format!("({current}/{howmany}) {} {pkg_name}", event.label());
        let label = term::truncate_to_width(&label, infolen.saturating_sub(1));
        let pad = infolen.saturating_sub(UnicodeWidthStr::width(label.as_str()) + 1);

        let bar_width = cols.saturating_sub(infolen).max(10);
        let filled = (bar_width * percent as usize / 100).min(bar_width);
        let fill: String = std::iter::repeat('#')
            .take(filled)
            .chain(std::iter::repeat('-').take(bar_width - filled))
            .collect();

        term::erase_line();
        eprint!("\r{label}{:pad$} [{fill}] {percent:3}%", "", pad = pad);

        if percent == 100 {
            eprintln!();
            self.end_progress_window(&mut state);
        }
    }

    fn download(&self, filename: &str, event: DownloadEvent) {
        let mut state = self.state.lock().unwrap();
        match event {
            DownloadEvent::Init => state.multibar.init(filename),
            DownloadEvent::Progress { downloaded, total } => state.multibar.progress(filename, downloaded, total),
            DownloadEvent::Complete(result) => state.multibar.complete(filename, result),
        }
    }
}
