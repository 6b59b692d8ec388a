//! The question/answer callback protocol (spec §3 `QuestionKind`, §4.6).

/// Closed set of interactive question kinds the back-end may ask, each
/// assignable a bit in `Config::ask_mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    InstallIgnorePkg,
    ReplacePkg,
    ConflictPkg,
    RemovePkgs,
    SelectProvider,
    CorruptedPkg,
    ImportKey,
}

impl QuestionKind {
    /// Bit position of this kind within `Config::ask_mask`.
    #[must_use]
    pub fn bit(self) -> u32 {
        match self {
            QuestionKind::InstallIgnorePkg => 1 << 0,
            QuestionKind::ReplacePkg => 1 << 1,
            QuestionKind::ConflictPkg => 1 << 2,
            QuestionKind::RemovePkgs => 1 << 3,
            QuestionKind::SelectProvider => 1 << 4,
            QuestionKind::CorruptedPkg => 1 << 5,
            QuestionKind::ImportKey => 1 << 6,
        }
    }

    /// The documented default answer for this kind (spec §4.6).
    #[must_use]
    pub fn default_yes(self) -> bool {
        matches!(
            self,
            QuestionKind::ReplacePkg | QuestionKind::CorruptedPkg | QuestionKind::ImportKey
        )
    }
}

/// Payload accompanying a question, varying by kind.
#[derive(Debug, Clone)]
pub enum QuestionPayload {
    InstallIgnorePkg { package: String },
    ReplacePkg { old: String, new: String, repo: String },
    ConflictPkg { target: String, conflicting: String },
    RemovePkgs { packages: Vec<String> },
    SelectProvider { dep: String, providers: Vec<String> },
    CorruptedPkg { path: String },
    ImportKey { keyid: String, uid: String },
}

impl QuestionPayload {
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionPayload::InstallIgnorePkg { .. } => QuestionKind::InstallIgnorePkg,
            QuestionPayload::ReplacePkg { .. } => QuestionKind::ReplacePkg,
            QuestionPayload::ConflictPkg { .. } => QuestionKind::ConflictPkg,
            QuestionPayload::RemovePkgs { .. } => QuestionKind::RemovePkgs,
            QuestionPayload::SelectProvider { .. } => QuestionKind::SelectProvider,
            QuestionPayload::CorruptedPkg { .. } => QuestionKind::CorruptedPkg,
            QuestionPayload::ImportKey { .. } => QuestionKind::ImportKey,
        }
    }
}

/// The answer written back into a question by `Callbacks::question`.
#[derive(Debug, Clone)]
pub enum Answer {
    /// A yes/no answer for every kind except `SelectProvider`.
    Bool(bool),
    /// The chosen provider index (0-based) for `SelectProvider`.
    ProviderIndex(usize),
}

/// A question passed to `Callbacks::question`; the driver writes its answer
/// back into `answer` before returning.
#[derive(Debug, Clone)]
pub struct Question {
    pub payload: QuestionPayload,
    pub answer: Option<Answer>,
}

impl Question {
    #[must_use]
    pub fn new(payload: QuestionPayload) -> Self {
        Self {
            payload,
            answer: None,
        }
    }
}
