//! Turn controller state machine
//!
//! Sequences overlapping asynchronous events — capture results, query
//! responses, playback completion, timers — into one coherent conversational
//! turn at a time. Within a turn, capture completion strictly precedes query
//! submission, which strictly precedes playback; across turns, playback
//! completion is the only trigger for the next capture window.
//!
//! The whole loop runs in a single spawned task ([`crate::ConversationMode`]
//! owns it). Every timer is a future inside that task, so there is no timer
//! bookkeeping to leak: cancelling the task cancels them all. A generation
//! counter bumped on every deactivation guards the one path where an event
//! could arrive from outside the task — a late capture result — so a stale
//! result is discarded instead of advancing the machine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

use docchat_config::ConversationConfig;
use docchat_core::{CaptureError, CaptureEvent, SpeechCapture, SpeechPlayback, TurnOrigin};

use crate::events::ConversationEvent;
use crate::session::ChatSession;

/// Where the hands-free loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No timers, no capture, no playback. Initial and final.
    Idle,
    /// Pre-listen countdown running
    CountingDown,
    /// One capture window open
    Listening,
    /// Query in flight
    Submitting,
    /// Answer being spoken
    Speaking,
    /// Waiting out the backoff after a silent window
    NoSpeechRetry,
    /// Unrecoverable adapter failure; terminal until the user reactivates
    Failed,
}

impl Default for Phase {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::CountingDown => "counting_down",
            Phase::Listening => "listening",
            Phase::Submitting => "submitting",
            Phase::Speaking => "speaking",
            Phase::NoSpeechRetry => "no_speech_retry",
            Phase::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Why the loop ended on its own
#[derive(Debug)]
pub(crate) enum LoopExit {
    Fatal(CaptureError),
    RetriesExhausted,
}

impl LoopExit {
    pub(crate) fn reason(&self) -> String {
        match self {
            LoopExit::Fatal(e) => format!("voice capture unavailable: {e}"),
            LoopExit::RetriesExhausted => "no speech detected; giving up".to_string(),
        }
    }

    pub(crate) fn is_fatal(&self) -> bool {
        matches!(self, LoopExit::Fatal(_))
    }
}

/// What one capture window produced
enum WindowOutcome {
    Utterance(String),
    Silent,
    Fatal(CaptureError),
}

/// The state machine driving the hands-free loop
pub struct TurnController {
    config: ConversationConfig,
    capture: Arc<dyn SpeechCapture>,
    playback: Arc<dyn SpeechPlayback>,
    chat: Arc<ChatSession>,
    phase: RwLock<Phase>,
    /// Bumped on every deactivation; events stamped with an older value are
    /// stale and must not advance the machine
    generation: AtomicU64,
    event_tx: broadcast::Sender<ConversationEvent>,
}

impl TurnController {
    pub fn new(
        config: ConversationConfig,
        capture: Arc<dyn SpeechCapture>,
        playback: Arc<dyn SpeechPlayback>,
        chat: Arc<ChatSession>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            config,
            capture,
            playback,
            chat,
            phase: RwLock::new(Phase::Idle),
            generation: AtomicU64::new(0),
            event_tx,
        }
    }

    /// Subscribe to controller events
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.event_tx.subscribe()
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        *self.phase.read()
    }

    pub(crate) fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub(crate) fn begin_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn emit(&self, event: ConversationEvent) {
        let _ = self.event_tx.send(event);
    }

    fn set_phase(&self, new: Phase) {
        let old = {
            let mut phase = self.phase.write();
            std::mem::replace(&mut *phase, new)
        };
        if old != new {
            tracing::debug!(%old, %new, "phase transition");
            self.emit(ConversationEvent::PhaseChanged { old, new });
        }
    }

    /// The hands-free loop. Runs until a fatal capture error or the silent
    /// retry cap; external deactivation cancels the future outright.
    pub(crate) async fn run_loop(&self, generation: u64) -> LoopExit {
        tokio::time::sleep(self.config.activation_settle()).await;
        self.emit(ConversationEvent::Activated);

        let mut first_turn = true;
        loop {
            // Optional pre-listen countdown; resume skips it when configured
            let use_countdown = first_turn || self.config.resume_with_countdown;
            first_turn = false;
            if use_countdown && self.config.countdown_secs > 0 {
                self.set_phase(Phase::CountingDown);
                for remaining in (1..=self.config.countdown_secs).rev() {
                    self.emit(ConversationEvent::CountdownTick { remaining });
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }

            // Listen until something usable arrives (or the loop dies)
            let question = match self.listen_for_question(generation).await {
                Ok(text) => text,
                Err(exit) => return exit,
            };

            // One query, single-flight, never retried
            self.set_phase(Phase::Submitting);
            self.emit(ConversationEvent::QuerySubmitted {
                question: question.clone(),
            });

            let answer = match self.chat.submit(TurnOrigin::Spoken, &question).await {
                Ok(answer) => answer,
                Err(e) => {
                    // Recorded as an error turn; the loop only continues by
                    // re-listening, not by resubmitting the question
                    self.emit(ConversationEvent::TurnFailed {
                        message: e.to_string(),
                    });
                    continue;
                },
            };
            self.emit(ConversationEvent::AnswerReceived {
                text: answer.clone(),
            });

            // Speak the answer; a synthesis failure must not stall the loop
            self.set_phase(Phase::Speaking);
            self.emit(ConversationEvent::SpeakingStarted);
            if let Err(e) = self
                .playback
                .speak(&answer, self.config.language)
                .await
            {
                tracing::warn!(error = %e, "playback failed; continuing");
                self.emit(ConversationEvent::PlaybackFailed {
                    message: e.to_string(),
                });
            }
            // Playback completion is the only trigger for the next window
        }
    }

    /// Open capture windows until one yields a submittable question.
    ///
    /// Silent windows and recoverable capture errors loop back to listening
    /// after the backoff — never through the countdown. Wake-word misses
    /// re-listen immediately.
    async fn listen_for_question(&self, generation: u64) -> Result<String, LoopExit> {
        let mut silent_attempts: u32 = 0;
        loop {
            self.set_phase(Phase::Listening);

            let text = match self.open_capture_window(generation).await {
                WindowOutcome::Utterance(text) => text,
                WindowOutcome::Fatal(e) => {
                    self.set_phase(Phase::Failed);
                    self.emit(ConversationEvent::TurnFailed {
                        message: e.to_string(),
                    });
                    return Err(LoopExit::Fatal(e));
                },
                WindowOutcome::Silent => {
                    silent_attempts += 1;
                    self.set_phase(Phase::NoSpeechRetry);
                    self.emit(ConversationEvent::NoSpeech {
                        attempt: silent_attempts,
                    });
                    if let Some(cap) = self.config.max_silent_retries {
                        if silent_attempts >= cap {
                            return Err(LoopExit::RetriesExhausted);
                        }
                    }
                    tokio::time::sleep(self.config.retry_backoff()).await;
                    continue;
                },
            };

            self.emit(ConversationEvent::UtteranceCaptured { text: text.clone() });

            match &self.config.wake_word {
                Some(token) => match strip_wake_word(&text, token) {
                    Some(rest) => return Ok(rest),
                    None => {
                        self.emit(ConversationEvent::WakeWordMissing { text });
                        // Discarded; straight back to listening
                        continue;
                    },
                },
                None => return Ok(text),
            }
        }
    }

    /// One bounded capture window: stop-on-result with a timeout fallback.
    async fn open_capture_window(&self, generation: u64) -> WindowOutcome {
        // Fresh single-event channel per attempt; the receiver dies with
        // this scope, so nothing from this window can outlive it
        let (tx, mut rx) = mpsc::channel::<CaptureEvent>(1);

        if let Err(e) = self.capture.start(tx).await {
            if e.is_fatal() {
                return WindowOutcome::Fatal(e);
            }
            tracing::debug!(error = %e, "capture failed to start");
            return WindowOutcome::Silent;
        }
        self.emit(ConversationEvent::ListeningStarted);

        let event = match timeout(self.config.capture_window(), rx.recv()).await {
            Err(_) => {
                // Window elapsed with no result
                self.capture.stop().await;
                return WindowOutcome::Silent;
            },
            Ok(None) => {
                // Adapter went away without delivering an event
                self.capture.stop().await;
                return WindowOutcome::Silent;
            },
            Ok(Some(event)) => event,
        };

        if self.current_generation() != generation {
            // Deactivated while the result was in flight
            return WindowOutcome::Silent;
        }

        match event {
            CaptureEvent::Utterance(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    WindowOutcome::Silent
                } else {
                    WindowOutcome::Utterance(text)
                }
            },
            CaptureEvent::Failed(e) if e.is_fatal() => WindowOutcome::Fatal(e),
            CaptureEvent::Failed(e) => {
                tracing::debug!(error = %e, "capture attempt failed");
                WindowOutcome::Silent
            },
        }
    }

    /// Uniform exit: stop whatever is outstanding and settle the phase.
    ///
    /// The submission gate needs no explicit release — its guard lives
    /// inside the loop future and was dropped with it.
    pub(crate) async fn finish(&self, reason: String, fatal: bool) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.capture.stop().await;
        self.playback.stop().await;
        if !fatal {
            self.set_phase(Phase::Idle);
        }
        tracing::info!(reason, "conversation mode off");
        self.emit(ConversationEvent::Deactivated { reason });
    }
}

/// Strip a leading wake token (case-insensitive, word-boundary) from an
/// utterance. Returns the remainder, or `None` when the token is absent or
/// nothing follows it.
fn strip_wake_word(text: &str, token: &str) -> Option<String> {
    let token = token.trim();
    if token.is_empty() {
        return Some(text.to_string());
    }

    // Match the token char by char against the original string, so the rest
    // offset is always a char boundary regardless of how lowercasing changes
    // byte lengths
    let mut end = 0;
    let mut chars = text.char_indices();
    for expected in token.chars() {
        match chars.next() {
            Some((i, c)) if c.to_lowercase().eq(expected.to_lowercase()) => {
                end = i + c.len_utf8();
            },
            _ => return None,
        }
    }
    let rest = &text[end..];

    // Token must end at a word boundary ("assist" must not match "assistant")
    if !rest.is_empty() && !rest.starts_with(|c: char| c.is_whitespace() || c == ',') {
        return None;
    }

    let remainder = rest
        .trim_start_matches(|c: char| c.is_whitespace() || c == ',')
        .trim();
    if remainder.is_empty() {
        None
    } else {
        Some(remainder.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::NoSpeechRetry.to_string(), "no_speech_retry");
        assert_eq!(Phase::default(), Phase::Idle);
    }

    #[test]
    fn test_strip_wake_word_present() {
        assert_eq!(
            strip_wake_word("assistant what time is it", "assistant"),
            Some("what time is it".to_string())
        );
        assert_eq!(
            strip_wake_word("Assistant, read the summary", "assistant"),
            Some("read the summary".to_string())
        );
    }

    #[test]
    fn test_strip_wake_word_absent() {
        assert_eq!(strip_wake_word("hello there", "assistant"), None);
    }

    #[test]
    fn test_strip_wake_word_is_word_bounded() {
        // "assist" must not gate through "assistance needed"
        assert_eq!(strip_wake_word("assistance needed", "assist"), None);
    }

    #[test]
    fn test_strip_wake_word_non_ascii_case() {
        // Case pairs whose UTF-8 lengths differ must neither panic nor
        // misalign the remainder
        assert_eq!(
            strip_wake_word("ŞEF bugünün menüsü ne", "şef"),
            Some("bugünün menüsü ne".to_string())
        );
        assert_eq!(
            strip_wake_word("STRAẞE kapalı mı", "straße"),
            Some("kapalı mı".to_string())
        );
        assert_eq!(strip_wake_word("İmdat ẞ deneme", "assistant"), None);
    }

    #[test]
    fn test_strip_wake_word_alone_is_not_a_question() {
        assert_eq!(strip_wake_word("assistant", "assistant"), None);
        assert_eq!(strip_wake_word("assistant   ", "assistant"), None);
    }

    #[test]
    fn test_loop_exit_reasons() {
        assert!(LoopExit::Fatal(CaptureError::Unsupported).is_fatal());
        assert!(!LoopExit::RetriesExhausted.is_fatal());
        assert!(LoopExit::RetriesExhausted.reason().contains("no speech"));
    }
}
