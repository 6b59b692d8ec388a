//! The capability record the driver hands to a back-end (spec §4.6, §9
//! "Callback pointers → capability record"). Grounded on the teacher's
//! `Reporter` trait: `Send + Sync`, dependency-injected, blanket-`impl`ed
//! over `Arc<T>` so the same handle can be shared with worker threads.

use crate::download::DownloadEvent;
use crate::events::Event;
use crate::log::Level;
use crate::progress::ProgressEvent;
use crate::question::Question;
use std::sync::Arc;

/// The five callbacks a back-end invokes into the driver, modeled as one
/// trait instead of five raw function pointers.
pub trait Callbacks: Send + Sync {
    /// A log message from the back-end. Implementations must buffer this
    /// while a progress bar is active rather than write it immediately
    /// (spec §4.6, §5 ordering guarantee).
    fn log(&self, level: Level, message: &str);

    /// A lifecycle event (dependency checks, transaction phases, package
    /// operations, hooks, …).
    fn event(&self, event: &Event);

    /// An interactive question. The implementation must write an answer
    /// into `question.answer` before returning.
    fn question(&self, question: &mut Question);

    /// A transaction-phase progress update. `current` is 1-based, `howmany`
    /// is the total count of targets in this phase.
    fn progress(&self, event: ProgressEvent, pkg_name: &str, percent: u8, howmany: usize, current: usize);

    /// A per-file download lifecycle event.
    fn download(&self, filename: &str, event: DownloadEvent);
}

impl<T: Callbacks + ?Sized> Callbacks for Arc<T> {
    fn log(&self, level: Level, message: &str) {
        (**self).log(level, message);
    }
    fn event(&self, event: &Event) {
        (**self).event(event);
    }
    fn question(&self, question: &mut Question) {
        (**self).question(question);
    }
    fn progress(&self, event: ProgressEvent, pkg_name: &str, percent: u8, howmany: usize, current: usize) {
        (**self).progress(event, pkg_name, percent, howmany, current);
    }
    fn download(&self, filename: &str, event: DownloadEvent) {
        (**self).download(filename, event);
    }
}

/// A callback implementation that discards everything. Useful for probe
/// transactions (deptest) that must not render UI.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCallbacks;

impl Callbacks for NullCallbacks {
    fn log(&self, _level: Level, _message: &str) {}
    fn event(&self, _event: &Event) {}
    fn question(&self, question: &mut Question) {
        let kind = question.payload.kind();
        question.answer = Some(crate::question::Answer::Bool(kind.default_yes()));
    }
    fn progress(&self, _event: ProgressEvent, _pkg_name: &str, _percent: u8, _howmany: usize, _current: usize) {}
    fn download(&self, _filename: &str, _event: DownloadEvent) {}
}
