//! Local adapter implementations behind the core trait seams
//!
//! Terminal builds ship without a microphone STT backend, so speech capture
//! is the always-failing [`UnavailableCapture`]; turning voice mode on
//! surfaces that as the fatal capture error and shuts the mode down again.
//! Speaker output goes through rodio when the `playback` feature is on.

use async_trait::async_trait;
use tokio::sync::mpsc;

use docchat_core::{AudioSink, CaptureError, CaptureEvent, SpeechCapture, SpeechSynthesisError};

/// Capture adapter for runtimes with no speech recognition backend.
///
/// Every attempt is rejected with the fatal [`CaptureError::Unsupported`],
/// which disables voice conversation until a real backend is plugged in.
pub struct UnavailableCapture;

#[async_trait]
impl SpeechCapture for UnavailableCapture {
    async fn start(&self, _events: mpsc::Sender<CaptureEvent>) -> Result<(), CaptureError> {
        Err(CaptureError::Unsupported)
    }

    async fn stop(&self) {}
}

/// Sink for builds without an audio device. Playing anything fails, which
/// the loop reports and then moves past.
pub struct NullSink;

#[async_trait]
impl AudioSink for NullSink {
    async fn play(&self, _audio: Vec<u8>) -> Result<(), SpeechSynthesisError> {
        Err(SpeechSynthesisError::Playback(
            "no audio output available".to_string(),
        ))
    }

    async fn stop(&self) {}
}

#[cfg(feature = "playback")]
pub use rodio_sink::RodioSink;

#[cfg(feature = "playback")]
mod rodio_sink {
    use std::io::Cursor;
    use std::sync::Arc;

    use async_trait::async_trait;
    use rodio::{Decoder, OutputStream, Sink};
    use tokio::sync::{mpsc, oneshot};

    use docchat_core::{AudioSink, SpeechSynthesisError};

    struct PlayRequest {
        audio: Vec<u8>,
        done: oneshot::Sender<Result<(), SpeechSynthesisError>>,
    }

    /// Speaker output through the default rodio device.
    ///
    /// The output stream is not `Send`, so it lives on a dedicated thread;
    /// clips are handed over through a channel and completion comes back on
    /// a oneshot. `stop` pokes the shared sink directly, which also makes an
    /// in-progress `play` resolve early.
    pub struct RodioSink {
        sink: Arc<Sink>,
        requests: mpsc::UnboundedSender<PlayRequest>,
    }

    impl RodioSink {
        /// Open the default output device and start the playback thread
        pub fn start() -> Result<Self, SpeechSynthesisError> {
            let (init_tx, init_rx) = std::sync::mpsc::channel();
            let (request_tx, mut request_rx) = mpsc::unbounded_channel::<PlayRequest>();

            std::thread::Builder::new()
                .name("audio-playback".to_string())
                .spawn(move || {
                    let (stream, handle) = match OutputStream::try_default() {
                        Ok(pair) => pair,
                        Err(e) => {
                            let _ = init_tx.send(Err(e.to_string()));
                            return;
                        },
                    };
                    let sink = match Sink::try_new(&handle) {
                        Ok(sink) => Arc::new(sink),
                        Err(e) => {
                            let _ = init_tx.send(Err(e.to_string()));
                            return;
                        },
                    };
                    let _ = init_tx.send(Ok(Arc::clone(&sink)));

                    // The stream must stay alive for as long as we play
                    let _stream = stream;
                    while let Some(request) = request_rx.blocking_recv() {
                        let result = match Decoder::new(Cursor::new(request.audio)) {
                            Ok(source) => {
                                sink.append(source);
                                // Returns early when stop() clears the queue
                                sink.sleep_until_end();
                                Ok(())
                            },
                            Err(e) => Err(SpeechSynthesisError::Playback(format!(
                                "undecodable audio: {e}"
                            ))),
                        };
                        let _ = request.done.send(result);
                    }
                })
                .map_err(|e| SpeechSynthesisError::Playback(e.to_string()))?;

            let sink = init_rx
                .recv()
                .map_err(|_| {
                    SpeechSynthesisError::Playback("audio thread died during setup".to_string())
                })?
                .map_err(SpeechSynthesisError::Playback)?;

            tracing::info!("audio output ready");
            Ok(Self {
                sink,
                requests: request_tx,
            })
        }
    }

    #[async_trait]
    impl AudioSink for RodioSink {
        async fn play(&self, audio: Vec<u8>) -> Result<(), SpeechSynthesisError> {
            if audio.is_empty() {
                return Ok(());
            }
            let (done_tx, done_rx) = oneshot::channel();
            self.requests
                .send(PlayRequest {
                    audio,
                    done: done_tx,
                })
                .map_err(|_| {
                    SpeechSynthesisError::Playback("audio thread terminated".to_string())
                })?;
            done_rx.await.map_err(|_| {
                SpeechSynthesisError::Playback("audio thread dropped the clip".to_string())
            })?
        }

        async fn stop(&self) {
            self.sink.stop();
        }
    }
}
