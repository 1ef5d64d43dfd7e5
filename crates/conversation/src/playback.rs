//! Spoken-answer playback
//!
//! Fetches synthesized audio from the query service and plays it through an
//! [`AudioSink`] to completion. One clip at a time: a second `speak` stops
//! the first before taking its place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use docchat_core::{AudioSink, Language, QueryService, SpeechPlayback, SpeechSynthesisError};

/// [`SpeechPlayback`] over the service's synthesis operation
pub struct SynthesizedPlayback {
    service: Arc<dyn QueryService>,
    sink: Arc<dyn AudioSink>,
    /// Serializes speakers; taken for the whole synthesize+play span
    slot: Mutex<()>,
    /// Bumped by every `speak` and `stop`; a speaker whose epoch is stale
    /// has been superseded and resolves without playing
    epoch: AtomicU64,
}

impl SynthesizedPlayback {
    pub fn new(service: Arc<dyn QueryService>, sink: Arc<dyn AudioSink>) -> Self {
        Self {
            service,
            sink,
            slot: Mutex::new(()),
            epoch: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl SpeechPlayback for SynthesizedPlayback {
    async fn speak(&self, text: &str, language: Language) -> Result<(), SpeechSynthesisError> {
        // Claim an epoch, interrupt whoever is speaking, then wait for the
        // slot to free up. The earlier speaker may still be synthesizing
        // rather than playing, so it checks the epoch itself below
        let my_epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.sink.stop().await;
        let _slot = self.slot.lock().await;
        if self.epoch.load(Ordering::SeqCst) != my_epoch {
            return Ok(());
        }

        tracing::debug!(chars = text.len(), %language, "synthesizing answer");
        let audio = self.service.synthesize(text, language).await?;
        if self.epoch.load(Ordering::SeqCst) != my_epoch {
            return Ok(());
        }

        self.sink.play(audio).await
    }

    async fn stop(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.sink.stop().await;
    }
}
