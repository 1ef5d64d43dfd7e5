//! Speech capture interface

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::CaptureError;

/// Outcome of one capture attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// A recognized utterance. May be empty when the recognizer produced
    /// only silence.
    Utterance(String),
    /// The attempt failed
    Failed(CaptureError),
}

/// Speech-to-text capture over one bounded listening window
///
/// Contract:
/// - `start` begins exactly one capture attempt and delivers **at most one**
///   [`CaptureEvent`] on the provided channel, exactly once per attempt.
/// - A second `start` while an attempt is outstanding fails with
///   [`CaptureError::Busy`].
/// - `stop` cancels the outstanding attempt. An implementation either
///   suppresses the late event or may still deliver it; the controller
///   discards stale events either way, so both behaviors are tolerated.
///
/// Side effect: starting a capture activates the runtime's microphone
/// indicator where one exists.
///
/// # Example
///
/// ```ignore
/// let (tx, mut rx) = mpsc::channel(1);
/// capture.start(tx).await?;
/// match rx.recv().await {
///     Some(CaptureEvent::Utterance(text)) => println!("heard: {text}"),
///     Some(CaptureEvent::Failed(e)) => eprintln!("capture failed: {e}"),
///     None => {} // attempt stopped
/// }
/// ```
#[async_trait]
pub trait SpeechCapture: Send + Sync + 'static {
    /// Begin one capture attempt
    ///
    /// # Arguments
    /// * `events` - Channel receiving the attempt's single outcome
    async fn start(&self, events: mpsc::Sender<CaptureEvent>) -> Result<(), CaptureError>;

    /// Cancel the outstanding attempt, if any. Idempotent.
    async fn stop(&self);
}
