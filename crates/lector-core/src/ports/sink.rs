//! Audio sink port: the isolated surface clips are played on.

use crate::speech::AudioClip;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// The playback surface failed.
///
/// Sink failures abort the current session but are logged rather than
/// surfaced: the usual cause is a deliberate stop racing an in-flight play.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The surface could not be created or has gone away.
    #[error("audio sink unavailable: {0}")]
    Unavailable(String),
    /// A clip could not be decoded or played.
    #[error("audio playback failed: {0}")]
    Playback(String),
}

/// An audio output surface.
///
/// | Operation | Contract |
/// |-----------|----------|
/// | `play`    | Resolves when the clip has played to completion, or once a concurrent `stop` has taken effect. |
/// | `stop`    | Halts any in-flight clip immediately; resolves once halted. Harmless when nothing is playing. |
///
/// Implementations use interior mutability; the queue shares one sink via
/// `Arc` across a whole session.
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, clip: AudioClip) -> Result<(), SinkError>;
    async fn stop(&self) -> Result<(), SinkError>;
}

/// Builds the audio sink on first use.
///
/// Creation can be slow (device handshakes), so it is deferred until a
/// session actually has audio to play.
#[async_trait]
pub trait SinkFactory: Send + Sync {
    async fn create(&self) -> Result<Arc<dyn AudioSink>, SinkError>;
}
