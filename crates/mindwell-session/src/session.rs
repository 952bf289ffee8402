//! In-memory state of one conversation thread.

use tracing::info;

use mindwell_core::types::{ChatMessage, Diagnosis, SessionKey};

// =============================================================================
// DiagnosisState
// =============================================================================

/// Current clinical assessment of a session.
///
/// `Empty` moves to `Assessed` on the first update and every later update
/// replaces the assessment wholesale. There is no way back to `Empty`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DiagnosisState {
    #[default]
    Empty,
    Assessed(Diagnosis),
}

impl DiagnosisState {
    pub fn from_option(diagnosis: Option<Diagnosis>) -> Self {
        match diagnosis {
            Some(d) => DiagnosisState::Assessed(d),
            None => DiagnosisState::Empty,
        }
    }

    pub fn current(&self) -> Option<&Diagnosis> {
        match self {
            DiagnosisState::Empty => None,
            DiagnosisState::Assessed(d) => Some(d),
        }
    }

    pub fn is_assessed(&self) -> bool {
        matches!(self, DiagnosisState::Assessed(_))
    }

    /// Replace the current assessment.
    pub fn update(&mut self, diagnosis: Diagnosis) {
        *self = DiagnosisState::Assessed(diagnosis);
    }
}

// =============================================================================
// Session
// =============================================================================

/// One conversation thread: its key, ordered history, and diagnosis.
#[derive(Clone, Debug)]
pub struct Session {
    key: SessionKey,
    history: Vec<ChatMessage>,
    diagnosis: DiagnosisState,
    /// Messages in the stored record as this handle last read or wrote it.
    stored_len: usize,
}

impl Session {
    /// A thread with nothing stored for it yet.
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            history: Vec::new(),
            diagnosis: DiagnosisState::Empty,
            stored_len: 0,
        }
    }

    /// A thread rebuilt from a stored snapshot.
    pub fn restored(
        key: SessionKey,
        history: Vec<ChatMessage>,
        diagnosis: Option<Diagnosis>,
    ) -> Self {
        Self {
            key,
            stored_len: history.len(),
            history,
            diagnosis: DiagnosisState::from_option(diagnosis),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn thread_id(&self) -> &str {
        &self.key.thread_id
    }

    pub fn user_id(&self) -> &str {
        &self.key.user_id
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn diagnosis(&self) -> Option<&Diagnosis> {
        self.diagnosis.current()
    }

    pub fn diagnosis_state(&self) -> &DiagnosisState {
        &self.diagnosis
    }

    pub fn stored_len(&self) -> usize {
        self.stored_len
    }

    /// Replace local state with a newer stored snapshot.
    pub(crate) fn adopt(&mut self, history: Vec<ChatMessage>, diagnosis: Option<Diagnosis>) {
        self.stored_len = history.len();
        self.history = history;
        self.diagnosis = DiagnosisState::from_option(diagnosis);
    }

    pub(crate) fn mark_stored(&mut self) {
        self.stored_len = self.history.len();
    }

    /// True until the first turn of the conversation has been recorded.
    pub fn is_first_turn(&self) -> bool {
        self.history.is_empty()
    }

    pub fn record_user_turn(&mut self, content: impl Into<String>) {
        self.history.push(ChatMessage::user(content));
    }

    /// Append a completed assistant reply. Called once per reply, never per fragment.
    pub fn record_assistant_turn(&mut self, content: impl Into<String>) {
        self.history.push(ChatMessage::assistant(content));
    }

    /// Stamp a new assessment and replace any prior one.
    pub fn update_diagnosis(
        &mut self,
        score: impl Into<String>,
        content: impl Into<String>,
        total_guess: impl Into<String>,
    ) -> Diagnosis {
        let diagnosis = Diagnosis::new(score, content, total_guess);
        info!(
            thread_id = %self.key.thread_id,
            score = %diagnosis.score,
            replaced = self.diagnosis.is_assessed(),
            "Diagnosis updated"
        );
        self.diagnosis.update(diagnosis.clone());
        diagnosis
    }
}

// =============================================================================
// Tests
// =============================================================================
