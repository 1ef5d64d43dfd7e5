//! Speech playback interfaces

use async_trait::async_trait;

use crate::error::SpeechSynthesisError;
use crate::language::Language;

/// Spoken answer playback
///
/// `speak` resolves when playback completes (or fails); the caller uses
/// completion as the trigger for the next capture window. Concurrent `speak`
/// calls are disallowed: an implementation must stop the active playback
/// before starting the new one, never mix audio.
#[async_trait]
pub trait SpeechPlayback: Send + Sync + 'static {
    /// Synthesize and play `text`, resolving on completion
    async fn speak(&self, text: &str, language: Language) -> Result<(), SpeechSynthesisError>;

    /// Cancel in-progress playback. Idempotent; an in-flight `speak`
    /// observes the stop and resolves early.
    async fn stop(&self);
}

/// A speaker device that plays encoded audio to completion
///
/// Decouples playback policy from the actual output device so tests and
/// headless builds run without one.
#[async_trait]
pub trait AudioSink: Send + Sync + 'static {
    /// Play a full audio clip (encoded bytes, e.g. MP3/WAV), resolving when
    /// the clip ends or is stopped
    async fn play(&self, audio: Vec<u8>) -> Result<(), SpeechSynthesisError>;

    /// Stop the current clip, if any
    async fn stop(&self);
}
