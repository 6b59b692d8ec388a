//! The per-file download event stream consumed by the multibar UI (spec §4.7).

/// Outcome reported by `Callbacks::download` on `DownloadEvent::Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadResult {
    Ok,
    UpToDate,
    Failed,
}

/// A single download lifecycle event. The back-end is expected to emit
/// `Init` exactly once, followed by zero or more `Progress`, followed by
/// exactly one `Complete`, all for the same `filename` (spec §5 ordering
/// guarantee).
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    Init,
    Progress { downloaded: u64, total: u64 },
    Complete(DownloadResult),
}
