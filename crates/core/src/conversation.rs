//! Conversation turn types
//!
//! A turn is one question paired with its answer. The transcript is an
//! append-only, chronological sequence of turns; entries are never reordered
//! or rewritten after they are appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a question entered the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOrigin {
    /// Entered via the text input
    Typed,
    /// Recognized from a spoken utterance
    Spoken,
}

impl TurnOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnOrigin::Typed => "typed",
            TurnOrigin::Spoken => "spoken",
        }
    }
}

impl std::fmt::Display for TurnOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One question/answer exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn id
    pub id: Uuid,
    /// How the question was entered
    pub origin: TurnOrigin,
    /// The question text
    pub question: String,
    /// The answer, once resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Error message when the query failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the question was asked
    pub asked_at: DateTime<Utc>,
    /// When the answer (or failure) arrived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answered_at: Option<DateTime<Utc>>,
}

impl Turn {
    /// Create a new unresolved turn
    pub fn new(origin: TurnOrigin, question: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin,
            question: question.into(),
            answer: None,
            error: None,
            asked_at: Utc::now(),
            answered_at: None,
        }
    }

    /// Create a typed turn
    pub fn typed(question: impl Into<String>) -> Self {
        Self::new(TurnOrigin::Typed, question)
    }

    /// Create a spoken turn
    pub fn spoken(question: impl Into<String>) -> Self {
        Self::new(TurnOrigin::Spoken, question)
    }

    /// Mark the turn answered
    pub fn resolve(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self.answered_at = Some(Utc::now());
        self
    }

    /// Mark the turn failed
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self.answered_at = Some(Utc::now());
        self
    }

    /// Whether the turn has an answer or a recorded failure
    pub fn is_settled(&self) -> bool {
        self.answer.is_some() || self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_lifecycle() {
        let turn = Turn::spoken("what is the refund policy");
        assert_eq!(turn.origin, TurnOrigin::Spoken);
        assert!(!turn.is_settled());

        let turn = turn.resolve("30 days, no questions asked");
        assert!(turn.is_settled());
        assert!(turn.answered_at.is_some());
        assert!(turn.error.is_none());
    }

    #[test]
    fn test_failed_turn() {
        let turn = Turn::typed("hello").fail("service unreachable");
        assert!(turn.is_settled());
        assert!(turn.answer.is_none());
        assert_eq!(turn.error.as_deref(), Some("service unreachable"));
    }
}
