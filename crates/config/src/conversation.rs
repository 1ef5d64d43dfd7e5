//! Conversation mode configuration
//!
//! All timings the turn controller runs on. Durations are stored as plain
//! millisecond/second fields so they deserialize from config files without
//! custom serde; accessor methods hand out `Duration`s.

use std::time::Duration;

use docchat_core::Language;
use serde::{Deserialize, Serialize};

/// Floor on the no-speech retry backoff. Retries may be unbounded while the
/// mode stays active, so the backoff must never drop below this or silence
/// turns into a tight loop.
pub const MIN_RETRY_BACKOFF_MS: u64 = 1000;

/// Settings for the hands-free conversation loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Visible pre-listen countdown in seconds. 0 skips straight to
    /// listening.
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u8,

    /// Bound on one capture window. The window closes on the first capture
    /// event or on this timeout, whichever comes first.
    #[serde(default = "default_capture_window_ms")]
    pub capture_window_ms: u64,

    /// Pause before re-listening after a silent window. Clamped to
    /// [`MIN_RETRY_BACKOFF_MS`].
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Cap on consecutive silent windows before the mode shuts itself off.
    /// `None` keeps the loop alive for as long as the mode is active.
    #[serde(default)]
    pub max_silent_retries: Option<u32>,

    /// Delay between activation and the first countdown, letting the UI
    /// settle.
    #[serde(default = "default_activation_settle_ms")]
    pub activation_settle_ms: u64,

    /// Whether the loop re-enters the countdown after an answer is spoken,
    /// or goes straight back to listening.
    #[serde(default = "default_true")]
    pub resume_with_countdown: bool,

    /// Optional wake token. When set, an utterance must start with it; the
    /// token is stripped and the remainder submitted.
    #[serde(default)]
    pub wake_word: Option<String>,

    /// Language passed through to query and synthesis
    #[serde(default)]
    pub language: Language,
}

fn default_countdown_secs() -> u8 {
    3
}

fn default_capture_window_ms() -> u64 {
    6000
}

fn default_retry_backoff_ms() -> u64 {
    1500
}

fn default_activation_settle_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            countdown_secs: default_countdown_secs(),
            capture_window_ms: default_capture_window_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_silent_retries: None,
            activation_settle_ms: default_activation_settle_ms(),
            resume_with_countdown: true,
            wake_word: None,
            language: Language::default(),
        }
    }
}

impl ConversationConfig {
    pub fn capture_window(&self) -> Duration {
        Duration::from_millis(self.capture_window_ms)
    }

    /// Backoff between silent windows, with the floor applied
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.max(MIN_RETRY_BACKOFF_MS))
    }

    pub fn activation_settle(&self) -> Duration {
        Duration::from_millis(self.activation_settle_ms)
    }

    /// Set the wake token (builder style, mainly for tests)
    pub fn with_wake_word(mut self, token: impl Into<String>) -> Self {
        self.wake_word = Some(token.into());
        self
    }

    /// Skip the countdown entirely
    pub fn without_countdown(mut self) -> Self {
        self.countdown_secs = 0;
        self.resume_with_countdown = false;
        self
    }
}
