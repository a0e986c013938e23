//! Shared mocks for the speaker integration tests.
//!
//! The mock synthesizer stamps each clip with its chunk's text, so the
//! call log can match playback back to chunks across sessions. Both mocks
//! burn mock time (`SYNTH_TIME`, `PLAY_TIME`) on the paused tokio clock,
//! which makes every interleaving deterministic on a current-thread
//! runtime while the tests themselves finish instantly.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lector_core::{
    AudioClip, AudioEncoding, AudioSink, Chunk, FixedSettings, SinkError, SinkFactory,
    SynthesisError, SynthesisOptions, Synthesizer, Utterance,
};
use lector_speaker::{ChunkerConfig, Speaker, SpeakerEvent};
use tokio::sync::{Notify, mpsc};

/// Synthesis takes this long in mock time.
pub const SYNTH_TIME: Duration = Duration::from_millis(10);

/// Each clip plays for this long in mock time, unless stopped.
pub const PLAY_TIME: Duration = Duration::from_millis(100);

/// Small enough that short single-word sentences get a chunk each.
pub const TEST_CHUNK_CHARS: usize = 8;

// ── Call log ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Synth(String),
    PlayStart(String),
    PlayEnd(String),
    SinkStop,
}

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn snapshot(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &Call) -> bool {
        self.snapshot().contains(needle)
    }

    pub fn position(&self, needle: &Call) -> usize {
        let calls = self.snapshot();
        calls
            .iter()
            .position(|c| c == needle)
            .unwrap_or_else(|| panic!("{needle:?} missing from {calls:?}"))
    }
}

// ── Mock synthesizer ───────────────────────────────────────────────

pub struct MockSynth {
    calls: CallLog,
    fails_at: Option<usize>,
    denies_auth: bool,
}

impl MockSynth {
    pub fn reliable(calls: &CallLog) -> Self {
        Self {
            calls: calls.clone(),
            fails_at: None,
            denies_auth: false,
        }
    }

    /// Fails the chunk with this index; earlier chunks succeed.
    pub fn failing_at(calls: &CallLog, index: usize) -> Self {
        Self {
            calls: calls.clone(),
            fails_at: Some(index),
            denies_auth: false,
        }
    }

    pub fn denying_auth(calls: &CallLog) -> Self {
        Self {
            calls: calls.clone(),
            fails_at: None,
            denies_auth: true,
        }
    }
}

#[async_trait]
impl Synthesizer for MockSynth {
    async fn synthesize(
        &self,
        chunk: &Chunk,
        _options: &SynthesisOptions,
    ) -> Result<AudioClip, SynthesisError> {
        self.calls.push(Call::Synth(chunk.text.clone()));
        tokio::time::sleep(SYNTH_TIME).await;
        if self.denies_auth {
            return Err(SynthesisError::Auth {
                message: "API key not valid".into(),
            });
        }
        if self.fails_at == Some(chunk.index) {
            return Err(SynthesisError::Backend {
                status: 500,
                message: "scripted backend failure".into(),
            });
        }
        Ok(AudioClip {
            bytes: chunk.text.clone().into_bytes(),
            encoding: AudioEncoding::Mp3,
        })
    }
}

// ── Mock sink ──────────────────────────────────────────────────────

/// Plays clips on the mock clock; a concurrent stop resolves them early.
pub struct MockSink {
    calls: CallLog,
    fails_on: Option<String>,
    stopped: Notify,
}

impl MockSink {
    pub fn smooth(calls: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            calls: calls.clone(),
            fails_on: None,
            stopped: Notify::new(),
        })
    }

    /// Fails to play the clip carrying exactly this text.
    pub fn failing_on(calls: &CallLog, text: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: calls.clone(),
            fails_on: Some(text.to_owned()),
            stopped: Notify::new(),
        })
    }
}

#[async_trait]
impl AudioSink for MockSink {
    async fn play(&self, clip: AudioClip) -> Result<(), SinkError> {
        let text = String::from_utf8_lossy(&clip.bytes).into_owned();
        self.calls.push(Call::PlayStart(text.clone()));
        if self.fails_on.as_deref() == Some(text.as_str()) {
            return Err(SinkError::Playback("scripted playback failure".into()));
        }
        tokio::select! {
            () = self.stopped.notified() => {}
            () = tokio::time::sleep(PLAY_TIME) => {}
        }
        self.calls.push(Call::PlayEnd(text));
        Ok(())
    }

    async fn stop(&self) -> Result<(), SinkError> {
        self.calls.push(Call::SinkStop);
        self.stopped.notify_waiters();
        Ok(())
    }
}

pub struct MockSinkFactory {
    sink: Arc<MockSink>,
    created: AtomicUsize,
}

impl MockSinkFactory {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SinkFactory for MockSinkFactory {
    async fn create(&self) -> Result<Arc<dyn AudioSink>, SinkError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.sink) as Arc<dyn AudioSink>)
    }
}

// ── Harness ────────────────────────────────────────────────────────

pub struct Harness {
    pub speaker: Arc<Speaker>,
    pub events: mpsc::UnboundedReceiver<SpeakerEvent>,
    pub calls: CallLog,
    pub factory: Arc<MockSinkFactory>,
}

pub fn wire(calls: &CallLog, synth: MockSynth, sink: Arc<MockSink>) -> Harness {
    let factory = Arc::new(MockSinkFactory {
        sink,
        created: AtomicUsize::new(0),
    });
    let (speaker, events) = Speaker::new(
        Arc::new(synth),
        Arc::new(FixedSettings::default()),
        Arc::clone(&factory) as Arc<dyn SinkFactory>,
    );
    let speaker = speaker.with_chunker(ChunkerConfig {
        max_chunk_chars: TEST_CHUNK_CHARS,
    });
    Harness {
        speaker: Arc::new(speaker),
        events,
        calls: calls.clone(),
        factory,
    }
}

pub fn utterance(text: &str) -> Utterance {
    Utterance {
        text: text.into(),
        encoding: AudioEncoding::Mp3,
    }
}

/// Current-thread runtime on the mock clock. Timers auto-advance whenever
/// the runtime runs out of ready tasks.
pub fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .expect("runtime builds")
}

// ── Event helpers ──────────────────────────────────────────────────

pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<SpeakerEvent>) -> Vec<SpeakerEvent> {
    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    events
}

/// Only the `playing` flags from `StateChanged` events, in order.
pub fn playing_flags(events: &[SpeakerEvent]) -> Vec<bool> {
    events
        .iter()
        .filter_map(|e| match e {
            SpeakerEvent::StateChanged { playing } => Some(*playing),
            SpeakerEvent::Trouble { .. } => None,
        })
        .collect()
}

/// Only the titles of `Trouble` events, in order.
pub fn trouble_titles(events: &[SpeakerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            SpeakerEvent::Trouble { title, .. } => Some(title.clone()),
            SpeakerEvent::StateChanged { .. } => None,
        })
        .collect()
}
