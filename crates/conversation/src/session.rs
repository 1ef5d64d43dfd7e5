//! Chat session: transcript ownership and the single-flight submission gate
//!
//! Both entry points — typed questions and the voice loop — go through
//! [`ChatSession::submit`], so the "at most one query in flight" guarantee
//! holds across them, not just within the controller.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use docchat_core::{
    DocumentSession, Language, QueryService, SpeechPlayback, SpeechSynthesisError, SubmitError,
    Turn, TurnOrigin,
};

/// One conversation against one uploaded document
pub struct ChatSession {
    service: Arc<dyn QueryService>,
    document: DocumentSession,
    language: Language,
    /// Append-only; entries are never reordered or rewritten
    transcript: RwLock<Vec<Turn>>,
    /// Single-flight gate shared by typed and spoken submissions
    submit_gate: Arc<Mutex<()>>,
}

impl ChatSession {
    pub fn new(
        service: Arc<dyn QueryService>,
        document: DocumentSession,
        language: Language,
    ) -> Self {
        Self {
            service,
            document,
            language,
            transcript: RwLock::new(Vec::new()),
            submit_gate: Arc::new(Mutex::new(())),
        }
    }

    /// The document this session queries
    pub fn document(&self) -> &DocumentSession {
        &self.document
    }

    /// Submit one question.
    ///
    /// Rejects (does not queue) when a query is already outstanding. The
    /// resulting turn is appended to the transcript whether the query
    /// succeeded or failed; the failed question is never retried here.
    pub async fn submit(&self, origin: TurnOrigin, question: &str) -> Result<String, SubmitError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SubmitError::EmptyQuestion);
        }

        // Held across the query await; dropped on completion or if the
        // calling task is cancelled, so deactivation always releases it.
        let _permit = self
            .submit_gate
            .clone()
            .try_lock_owned()
            .map_err(|_| SubmitError::InFlight)?;

        let turn = Turn::new(origin, question);
        tracing::debug!(origin = %origin, question, "submitting query");

        match self
            .service
            .query(&self.document.id, question, self.language)
            .await
        {
            Ok(answer) => {
                self.transcript.write().push(turn.resolve(&answer));
                Ok(answer)
            },
            Err(e) => {
                tracing::warn!(error = %e, "query failed");
                self.transcript.write().push(turn.fail(e.to_string()));
                Err(e.into())
            },
        }
    }

    /// Snapshot of the transcript so far
    pub fn transcript(&self) -> Vec<Turn> {
        self.transcript.read().clone()
    }

    pub fn turn_count(&self) -> usize {
        self.transcript.read().len()
    }

    /// Read a past answer aloud. Stops any current playback first; a second
    /// concurrent playback is never mixed in.
    pub async fn speak_turn(
        &self,
        index: usize,
        playback: &dyn SpeechPlayback,
    ) -> Result<(), SpeechSynthesisError> {
        let answer = self
            .transcript
            .read()
            .get(index)
            .and_then(|turn| turn.answer.clone());

        let Some(answer) = answer else {
            return Err(SpeechSynthesisError::Playback(format!(
                "turn {index} has no answer to read"
            )));
        };

        playback.stop().await;
        playback.speak(&answer, self.language).await
    }
}
