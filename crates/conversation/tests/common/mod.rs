//! Scripted adapters for exercising the turn controller without a
//! microphone, a speaker or a running service.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, Notify};

use docchat_config::ConversationConfig;
use docchat_conversation::{ChatSession, ConversationEvent, ConversationMode, TurnController};
use docchat_core::{
    CaptureError, CaptureEvent, DocumentSession, DocumentUpload, Language, QueryError,
    QueryService, SessionId, SpeechCapture, SpeechPlayback, SpeechSynthesisError, UploadError,
    UploadReceipt,
};

/// What one capture attempt should do
#[derive(Debug, Clone)]
pub enum CaptureScript {
    /// Deliver an utterance after `delay`
    Utterance { text: String, delay: Duration },
    /// Deliver nothing; the window has to time out
    Silence,
    /// Hold the event channel open forever without delivering anything, the
    /// way a live microphone does when nobody talks
    Hang,
    /// Deliver a capture failure immediately
    Fail(CaptureError),
}

impl CaptureScript {
    pub fn utterance(text: &str, delay: Duration) -> Self {
        Self::Utterance {
            text: text.to_string(),
            delay,
        }
    }
}

/// Capture adapter that replays a queued script, one entry per attempt
pub struct ScriptedCapture {
    script: Mutex<VecDeque<CaptureScript>>,
    active: Arc<AtomicBool>,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl ScriptedCapture {
    pub fn new(script: Vec<CaptureScript>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            active: Arc::new(AtomicBool::new(false)),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechCapture for ScriptedCapture {
    async fn start(&self, events: mpsc::Sender<CaptureEvent>) -> Result<(), CaptureError> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::Busy);
        }
        self.starts.fetch_add(1, Ordering::SeqCst);

        let step = self.script.lock().pop_front();
        match step {
            Some(CaptureScript::Utterance { text, delay }) => {
                let active = Arc::clone(&self.active);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    // Send fails silently when the window was already
                    // stopped; the controller must tolerate that
                    let _ = events.send(CaptureEvent::Utterance(text)).await;
                    active.store(false, Ordering::SeqCst);
                });
            },
            Some(CaptureScript::Hang) => {
                // Park the sender so the channel never closes; only the
                // controller's window timeout (and its stop call) ends this
                // attempt
                tokio::spawn(async move {
                    let _events = events;
                    std::future::pending::<()>().await;
                });
            },
            Some(CaptureScript::Fail(error)) => {
                let active = Arc::clone(&self.active);
                tokio::spawn(async move {
                    let _ = events.send(CaptureEvent::Failed(error)).await;
                    active.store(false, Ordering::SeqCst);
                });
            },
            // Script exhausted or explicit silence: never deliver
            Some(CaptureScript::Silence) | None => {},
        }
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Playback adapter that records calls; completion can be gated on a manual
/// trigger to hold the controller in `Speaking`
pub struct RecordingPlayback {
    pub spoken: Mutex<Vec<String>>,
    pub stops: AtomicUsize,
    manual: bool,
    trigger: Notify,
    fail_with: Mutex<Option<SpeechSynthesisError>>,
}

impl RecordingPlayback {
    /// Playback completes as soon as it starts
    pub fn immediate() -> Self {
        Self {
            spoken: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            manual: false,
            trigger: Notify::new(),
            fail_with: Mutex::new(None),
        }
    }

    /// Playback completes only when [`Self::complete`] is called
    pub fn manual() -> Self {
        Self {
            manual: true,
            ..Self::immediate()
        }
    }

    /// Every `speak` fails with this error
    pub fn failing(error: SpeechSynthesisError) -> Self {
        Self {
            fail_with: Mutex::new(Some(error)),
            ..Self::immediate()
        }
    }

    /// Fire the (possibly late) completion event
    pub fn complete(&self) {
        self.trigger.notify_one();
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechPlayback for RecordingPlayback {
    async fn speak(&self, text: &str, _language: Language) -> Result<(), SpeechSynthesisError> {
        if let Some(error) = self.fail_with.lock().clone() {
            return Err(error);
        }
        self.spoken.lock().push(text.to_string());
        if self.manual {
            self.trigger.notified().await;
        }
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Query service stub that records questions and tracks concurrency
pub struct CountingQueryService {
    pub questions: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    response_delay: Duration,
    fail_queries: AtomicBool,
}

impl CountingQueryService {
    pub fn new() -> Self {
        Self::with_delay(Duration::from_millis(10))
    }

    pub fn with_delay(response_delay: Duration) -> Self {
        Self {
            questions: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            response_delay,
            fail_queries: AtomicBool::new(false),
        }
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn question_count(&self) -> usize {
        self.questions.lock().len()
    }

    pub fn recorded_questions(&self) -> Vec<String> {
        self.questions.lock().clone()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryService for CountingQueryService {
    async fn upload(&self, _upload: DocumentUpload) -> Result<UploadReceipt, UploadError> {
        unimplemented!("upload is not exercised through the controller")
    }

    async fn query(
        &self,
        _session: &SessionId,
        question: &str,
        _language: Language,
    ) -> Result<String, QueryError> {
        self.questions.lock().push(question.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.response_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_queries.load(Ordering::SeqCst) {
            Err(QueryError::Service {
                status: 500,
                message: "backend exploded".to_string(),
            })
        } else {
            Ok(format!("answer: {question}"))
        }
    }

    async fn synthesize(
        &self,
        _text: &str,
        _language: Language,
    ) -> Result<Vec<u8>, SpeechSynthesisError> {
        Ok(vec![0u8; 16])
    }
}

/// Everything a controller test needs, wired together
pub struct Rig {
    pub capture: Arc<ScriptedCapture>,
    pub playback: Arc<RecordingPlayback>,
    pub service: Arc<CountingQueryService>,
    pub chat: Arc<ChatSession>,
    pub mode: ConversationMode,
    pub events: broadcast::Receiver<ConversationEvent>,
}

pub fn rig(config: ConversationConfig, script: Vec<CaptureScript>) -> Rig {
    rig_with(
        config,
        Arc::new(ScriptedCapture::new(script)),
        Arc::new(RecordingPlayback::immediate()),
        Arc::new(CountingQueryService::new()),
    )
}

pub fn rig_with(
    config: ConversationConfig,
    capture: Arc<ScriptedCapture>,
    playback: Arc<RecordingPlayback>,
    service: Arc<CountingQueryService>,
) -> Rig {
    let document = DocumentSession::from_receipt(UploadReceipt {
        session_id: SessionId::new("doc-1"),
        display_name: "handbook.pdf".to_string(),
        chunk_count: 12,
        images_processed: 0,
    });
    let chat = Arc::new(ChatSession::new(
        service.clone() as Arc<dyn QueryService>,
        document,
        config.language,
    ));
    let controller = Arc::new(TurnController::new(
        config,
        capture.clone() as Arc<dyn SpeechCapture>,
        playback.clone() as Arc<dyn SpeechPlayback>,
        chat.clone(),
    ));
    let events = controller.subscribe();
    let mode = ConversationMode::new(controller);

    Rig {
        capture,
        playback,
        service,
        chat,
        mode,
        events,
    }
}

/// Receive the next event, failing the test if none arrives in (virtual)
/// time
pub async fn next_event(rx: &mut broadcast::Receiver<ConversationEvent>) -> ConversationEvent {
    tokio::time::timeout(Duration::from_secs(300), rx.recv())
        .await
        .expect("no event within 300s of virtual time")
        .expect("event channel closed")
}

/// Drain events until one matches, returning it
pub async fn wait_for<F>(
    rx: &mut broadcast::Receiver<ConversationEvent>,
    mut pred: F,
) -> ConversationEvent
where
    F: FnMut(&ConversationEvent) -> bool,
{
    loop {
        let event = next_event(rx).await;
        if pred(&event) {
            return event;
        }
    }
}
