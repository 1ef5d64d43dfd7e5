//! Terminal entry point for the document chat client
//!
//! Uploads the document named on the command line, then runs a line-oriented
//! chat loop against it. `/voice on` starts the hands-free conversation loop
//! (which on this build reports capture as unsupported until a speech
//! backend is plugged in); `/say N` reads a past answer aloud.

mod adapters;

use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncBufReadExt;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use docchat_client::{ClientConfig, ServiceClient};
use docchat_config::{load_settings, Settings};
use docchat_conversation::{
    ChatSession, ConversationEvent, ConversationMode, SynthesizedPlayback, TurnController,
};
use docchat_core::{
    AudioSink, DocumentSession, DocumentUpload, QueryService, SpeechCapture, SpeechPlayback,
    SubmitError, TurnOrigin,
};

use adapters::UnavailableCapture;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("DOCCHAT_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!("Warning: failed to load config: {e}. Using defaults.");
            Settings::default()
        },
    };

    init_tracing(&settings);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = env.as_deref().unwrap_or("default"),
        "starting docchat"
    );

    let path = std::env::args()
        .nth(1)
        .context("usage: docchat <document>")?;
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("cannot read {path}"))?;
    let file_name = Path::new(&path)
        .file_name()
        .and_then(|n| n.to_str())
        .context("document path has no file name")?
        .to_string();

    let client = Arc::new(ServiceClient::new(ClientConfig::from(&settings.service))?);
    let service: Arc<dyn QueryService> = client.clone();

    println!("Uploading {file_name}...");
    let receipt = service
        .upload(DocumentUpload::new(file_name, bytes))
        .await
        .context("document upload failed")?;
    let document = DocumentSession::from_receipt(receipt);
    println!(
        "Ready: {} ({} chunks, {} images)",
        document.display_name, document.chunk_count, document.images_processed
    );

    let chat = Arc::new(ChatSession::new(
        service.clone(),
        document,
        settings.conversation.language,
    ));
    let playback = Arc::new(SynthesizedPlayback::new(service.clone(), build_sink()));
    let capture: Arc<dyn SpeechCapture> = Arc::new(UnavailableCapture);
    let controller = Arc::new(TurnController::new(
        settings.conversation.clone(),
        capture,
        playback.clone() as Arc<dyn SpeechPlayback>,
        chat.clone(),
    ));
    spawn_event_printer(controller.subscribe());
    let mode = ConversationMode::new(controller);

    println!("Type a question. Commands: /voice on|off, /say N, /status, /quit");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            },
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if run_command(command, &mode, &chat, &client, &playback).await {
                break;
            }
            continue;
        }

        match chat.submit(TurnOrigin::Typed, line).await {
            Ok(answer) => println!("\n{answer}\n"),
            Err(SubmitError::InFlight) => {
                println!("a question is already in flight; wait for the answer")
            },
            Err(e) => println!("error: {e}"),
        }
    }

    mode.deactivate().await;
    if let Err(e) = client.delete_session(&chat.document().id).await {
        tracing::debug!(error = %e, "session cleanup failed");
    }

    Ok(())
}

/// Handle a `/command` line. Returns true when the loop should exit.
async fn run_command(
    command: &str,
    mode: &ConversationMode,
    chat: &Arc<ChatSession>,
    client: &Arc<ServiceClient>,
    playback: &Arc<SynthesizedPlayback>,
) -> bool {
    let parts: Vec<&str> = command.split_whitespace().collect();
    match parts.as_slice() {
        ["voice", "on"] => mode.activate(),
        ["voice", "off"] => mode.deactivate().await,
        ["say", n] => match n.parse::<usize>() {
            // Turns are numbered from 1 in the transcript the user sees
            Ok(n) if n >= 1 => {
                if let Err(e) = chat.speak_turn(n - 1, &**playback).await {
                    println!("cannot read turn {n}: {e}");
                }
            },
            _ => println!("usage: /say <turn number>"),
        },
        ["status"] => match client.status(&chat.document().id).await {
            Ok(status) => println!(
                "{}: {} ({} chars, {} images)",
                status.filename, status.status, status.text_length, status.num_images
            ),
            Err(e) => println!("status unavailable: {e}"),
        },
        ["quit"] | ["exit"] => return true,
        _ => println!("unknown command: /{command}"),
    }
    false
}

/// Print controller events as user-facing status lines
fn spawn_event_printer(mut events: broadcast::Receiver<ConversationEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn print_event(event: ConversationEvent) {
    match event {
        ConversationEvent::Activated => println!("[voice] conversation mode on"),
        ConversationEvent::CountdownTick { remaining } => {
            println!("[voice] listening in {remaining}...")
        },
        ConversationEvent::ListeningStarted => println!("[voice] listening..."),
        ConversationEvent::UtteranceCaptured { text } => println!("[voice] heard: {text}"),
        ConversationEvent::NoSpeech { attempt } => {
            println!("[voice] no speech detected ({attempt}), retrying")
        },
        ConversationEvent::WakeWordMissing { .. } => {
            println!("[voice] start with the wake word to ask")
        },
        ConversationEvent::QuerySubmitted { question } => println!("[voice] asking: {question}"),
        ConversationEvent::AnswerReceived { text } => println!("\n{text}\n"),
        ConversationEvent::SpeakingStarted => println!("[voice] speaking..."),
        ConversationEvent::PlaybackFailed { message } => {
            println!("[voice] playback failed: {message}")
        },
        ConversationEvent::TurnFailed { message } => println!("[voice] {message}"),
        ConversationEvent::Deactivated { reason } => {
            println!("[voice] conversation mode off ({reason})")
        },
        ConversationEvent::PhaseChanged { .. } => {},
    }
}

#[cfg(feature = "playback")]
fn build_sink() -> Arc<dyn AudioSink> {
    match adapters::RodioSink::start() {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            tracing::warn!(error = %e, "audio output unavailable; answers stay text-only");
            Arc::new(adapters::NullSink)
        },
    }
}

#[cfg(not(feature = "playback"))]
fn build_sink() -> Arc<dyn AudioSink> {
    Arc::new(adapters::NullSink)
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("docchat={}", settings.log.level).into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.log.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
