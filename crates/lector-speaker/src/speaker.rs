//! Playback sessions: chunk, synthesize ahead, play in order.
//!
//! ```text
//!   speak ──► synthesize chunk 0 ──► play 0 ──► play 1 ──► … ──► idle
//!                                     │           │
//!                                     └ prefetch 1 └ prefetch 2
//! ```
//!
//! One session at a time: starting a new one cancels and fully unwinds the
//! previous one first. While chunk `i` plays, chunk `i + 1` synthesizes in
//! the background, so the remote service sees at most one request in
//! flight and playback order always matches chunk order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lector_core::{
    AudioClip, Chunk, SettingsProvider, SinkFactory, SynthesisError, SynthesisOptions, Synthesizer,
    Utterance,
};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::chunker::{ChunkerConfig, chunk_text};
use crate::error::SpeakerError;
use crate::sink::SharedSink;

// ── Events emitted to the presentation layer ───────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakerEvent {
    /// Playback started or finished.
    StateChanged { playing: bool },

    /// A failure worth showing to the person listening.
    Trouble { title: String, detail: String },
}

// ── Speaker ────────────────────────────────────────────────────────

/// Drives utterances through chunking, synthesis, and playback.
///
/// All methods take `&self`; the speaker is meant to be shared behind an
/// `Arc` between whatever starts speech and whatever stops it.
pub struct Speaker {
    synth: Arc<dyn Synthesizer>,
    settings: Arc<dyn SettingsProvider>,
    sink: SharedSink,
    chunker: ChunkerConfig,
    events: mpsc::UnboundedSender<SpeakerEvent>,

    /// Serializes sessions: the holder is the one speaking.
    session: Mutex<()>,

    /// Cancellation token of the current (or most recent) session. Never
    /// held across an await; keeps the spent token after a session ends,
    /// where cancelling it again is harmless.
    cancel: std::sync::Mutex<Option<CancellationToken>>,

    playing: AtomicBool,
}

impl Speaker {
    /// Create a speaker and the receiver for its [`SpeakerEvent`]s.
    #[must_use]
    pub fn new(
        synth: Arc<dyn Synthesizer>,
        settings: Arc<dyn SettingsProvider>,
        sink_factory: Arc<dyn SinkFactory>,
    ) -> (Self, mpsc::UnboundedReceiver<SpeakerEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let speaker = Self {
            synth,
            settings,
            sink: SharedSink::new(sink_factory),
            chunker: ChunkerConfig::default(),
            events: event_tx,
            session: Mutex::new(()),
            cancel: std::sync::Mutex::new(None),
            playing: AtomicBool::new(false),
        };
        (speaker, event_rx)
    }

    /// Replace the chunking configuration.
    #[must_use]
    pub fn with_chunker(mut self, chunker: ChunkerConfig) -> Self {
        self.chunker = chunker;
        self
    }

    /// Whether a playback session is currently running. Non-blocking.
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    // ── Playback ───────────────────────────────────────────────────

    /// Speak `utterance`, replacing any session already running.
    ///
    /// Resolves when playback finishes, is stopped, or fails. Stopping is
    /// not an error: a cancelled session resolves `Ok`. Whitespace-only
    /// utterances are a quiet no-op.
    pub async fn speak(&self, utterance: Utterance) -> Result<(), SpeakerError> {
        let chunks = chunk_text(&utterance.text, &self.chunker);
        if chunks.is_empty() {
            tracing::debug!("utterance has no speakable text");
            return Ok(());
        }
        let options = self.settings.snapshot().options_for(utterance.encoding);
        let token = self.replace_session_token();

        // Waits for the previous session to unwind before starting.
        let _session = self.session.lock().await;
        if token.is_cancelled() {
            // A newer start or an explicit stop superseded this one
            // while it queued.
            return Ok(());
        }
        // The replaced session's last clip may still be sounding. Cut it
        // off before this session synthesizes anything.
        self.halt_sink().await;

        tracing::debug!(
            chunks = chunks.len(),
            encoding = %utterance.encoding,
            "starting playback session"
        );
        self.set_playing(true);
        let result = self.run_session(&chunks, &options, &token).await;
        self.set_playing(false);

        if let Err(e) = &result {
            if let Some(message) = e.user_message() {
                self.emit(SpeakerEvent::Trouble {
                    title: message.title,
                    detail: message.detail,
                });
            }
        }
        result
    }

    /// Synthesize the whole utterance without playing it.
    ///
    /// Chunks are fetched one at a time and their encoded bytes
    /// concatenated in order. Replaces any running playback session.
    pub async fn download(&self, utterance: Utterance) -> Result<AudioClip, SpeakerError> {
        let chunks = chunk_text(&utterance.text, &self.chunker);
        if chunks.is_empty() {
            return Err(SpeakerError::EmptyUtterance);
        }
        let options = self.settings.snapshot().options_for(utterance.encoding);
        let token = self.replace_session_token();

        let _session = self.session.lock().await;
        if token.is_cancelled() {
            return Err(SpeakerError::Cancelled);
        }
        // Playback replaced by a download goes quiet right away.
        self.halt_sink().await;

        tracing::debug!(chunks = chunks.len(), "downloading synthesized audio");
        let mut bytes = Vec::new();
        for chunk in &chunks {
            let clip = tokio::select! {
                biased;
                () = token.cancelled() => return Err(SpeakerError::Cancelled),
                result = self.synth.synthesize(chunk, &options) => result?,
            };
            bytes.extend_from_slice(&clip.bytes);
        }
        Ok(AudioClip {
            bytes,
            encoding: utterance.encoding,
        })
    }

    /// Stop the current session, if any.
    ///
    /// Cancels the session token, then halts the sink when one exists.
    /// Resolves once the sink has halted; idempotent when idle.
    pub async fn stop(&self) {
        let token = {
            let slot = self
                .cancel
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            slot.clone()
        };
        if let Some(token) = token {
            token.cancel();
        }
        self.halt_sink().await;
    }

    /// Halt the sink when one already exists. Stopping never conjures an
    /// audio device into existence.
    async fn halt_sink(&self) {
        if let Some(sink) = self.sink.get_if_created().await {
            if let Err(e) = sink.stop().await {
                tracing::warn!(error = %e, "audio sink refused to stop");
            }
        }
    }

    // ── Session internals ──────────────────────────────────────────

    /// Play `chunks` in order, synthesizing one chunk ahead.
    ///
    /// Cancellation is checked before each synthesis, each play, and each
    /// prefetch join, and resolves the session `Ok`. Synthesis failures
    /// propagate; sink failures are logged and end the session quietly.
    async fn run_session(
        &self,
        chunks: &[Chunk],
        options: &SynthesisOptions,
        cancel: &CancellationToken,
    ) -> Result<(), SpeakerError> {
        // The first chunk is synthesized before any audio plays.
        let mut clip = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            result = self.synth.synthesize(&chunks[0], options) => result?,
        };
        let sink = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            created = self.sink.get() => match created {
                Ok(sink) => sink,
                Err(e) => {
                    tracing::warn!(error = %e, "audio sink unavailable, dropping session");
                    return Ok(());
                }
            },
        };

        let mut next = 1;
        loop {
            // The next chunk synthesizes while the current one plays.
            let prefetch = chunks.get(next).map(|chunk| {
                let synth = Arc::clone(&self.synth);
                let chunk = chunk.clone();
                let options = options.clone();
                tokio::spawn(async move { synth.synthesize(&chunk, &options).await })
            });

            let played = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    abort_prefetch(prefetch);
                    return Ok(());
                }
                result = sink.play(clip) => result,
            };
            if let Err(e) = played {
                tracing::warn!(
                    error = %e,
                    chunk = next - 1,
                    "playback failed, dropping the rest of the session"
                );
                abort_prefetch(prefetch);
                return Ok(());
            }

            let Some(mut handle) = prefetch else {
                // That was the last chunk.
                return Ok(());
            };
            clip = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    handle.abort();
                    return Ok(());
                }
                joined = &mut handle => match joined {
                    Ok(result) => result?,
                    Err(e) if e.is_cancelled() => return Ok(()),
                    Err(e) => {
                        return Err(SpeakerError::Internal(format!(
                            "prefetch task failed: {e}"
                        )));
                    }
                },
            };
            next += 1;
        }
    }

    /// Install a fresh token as the current session and cancel the one it
    /// replaces.
    fn replace_session_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = {
            let mut slot = self
                .cancel
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            slot.replace(token.clone())
        };
        if let Some(previous) = previous {
            previous.cancel();
        }
        token
    }

    fn set_playing(&self, playing: bool) {
        if self.playing.swap(playing, Ordering::SeqCst) != playing {
            self.emit(SpeakerEvent::StateChanged { playing });
        }
    }

    /// Best-effort emission; a dropped receiver only costs a warning.
    fn emit(&self, event: SpeakerEvent) {
        if self.events.send(event).is_err() {
            tracing::warn!("speaker event receiver dropped");
        }
    }
}

fn abort_prefetch(prefetch: Option<JoinHandle<Result<AudioClip, SynthesisError>>>) {
    if let Some(handle) = prefetch {
        handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lector_core::{AudioEncoding, AudioSink, FixedSettings, SinkError};

    struct NullSynth;

    #[async_trait]
    impl Synthesizer for NullSynth {
        async fn synthesize(
            &self,
            chunk: &Chunk,
            _options: &SynthesisOptions,
        ) -> Result<AudioClip, SynthesisError> {
            Ok(AudioClip {
                bytes: vec![u8::try_from(chunk.index).unwrap()],
                encoding: AudioEncoding::Mp3,
            })
        }
    }

    struct NullSink;

    #[async_trait]
    impl AudioSink for NullSink {
        async fn play(&self, _clip: AudioClip) -> Result<(), SinkError> {
            Ok(())
        }

        async fn stop(&self) -> Result<(), SinkError> {
            Ok(())
        }
    }

    struct NullFactory;

    #[async_trait]
    impl SinkFactory for NullFactory {
        async fn create(&self) -> Result<Arc<dyn AudioSink>, SinkError> {
            Ok(Arc::new(NullSink))
        }
    }

    fn quiet_speaker() -> (Speaker, mpsc::UnboundedReceiver<SpeakerEvent>) {
        Speaker::new(
            Arc::new(NullSynth),
            Arc::new(FixedSettings::default()),
            Arc::new(NullFactory),
        )
    }

    fn utterance(text: &str) -> Utterance {
        Utterance {
            text: text.into(),
            encoding: AudioEncoding::Mp3,
        }
    }

    #[tokio::test]
    async fn a_fresh_speaker_is_idle() {
        let (speaker, _events) = quiet_speaker();
        assert!(!speaker.is_speaking());
    }

    #[tokio::test]
    async fn whitespace_only_utterance_is_a_quiet_no_op() {
        let (speaker, mut events) = quiet_speaker();
        speaker
            .speak(utterance("   \n\t"))
            .await
            .expect("no-op succeeds");
        assert!(!speaker.is_speaking());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn stop_with_no_session_is_harmless() {
        let (speaker, _events) = quiet_speaker();
        speaker.stop().await;
        speaker.stop().await;
        assert!(!speaker.is_speaking());
    }

    #[tokio::test]
    async fn a_finished_session_reports_both_transitions() {
        let (speaker, mut events) = quiet_speaker();
        speaker
            .speak(utterance("One. Two."))
            .await
            .expect("session plays through");
        assert!(!speaker.is_speaking());
        assert_eq!(
            events.try_recv().expect("start event"),
            SpeakerEvent::StateChanged { playing: true }
        );
        assert_eq!(
            events.try_recv().expect("finish event"),
            SpeakerEvent::StateChanged { playing: false }
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn download_of_nothing_is_an_error() {
        let (speaker, _events) = quiet_speaker();
        let err = speaker
            .download(utterance("  "))
            .await
            .expect_err("nothing to download");
        assert!(matches!(err, SpeakerError::EmptyUtterance));
    }
}
