//! Synthesis port: one chunk of text in, one encoded clip out.

use crate::settings::SynthesisOptions;
use crate::speech::{AudioClip, Chunk};
use async_trait::async_trait;
use thiserror::Error;

/// Why a synthesis request failed.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The credential is missing or was rejected. Terminal for the whole
    /// session: callers must abort, not retry.
    #[error("synthesis authorization failed: {message}")]
    Auth { message: String },

    /// The service answered with a non-success status, or with a body that
    /// could not be interpreted. `message` is the service's own
    /// explanation when one was provided.
    #[error("synthesis backend error (status {status}): {message}")]
    Backend { status: u16, message: String },

    /// The request never produced an HTTP response (DNS, TLS, timeout).
    #[error("synthesis network error: {source}")]
    Network {
        #[source]
        source: anyhow::Error,
    },
}

/// Converts one chunk into encoded audio via the remote service.
///
/// Implementations perform exactly one attempt per call. Retry policy
/// belongs to callers, and the playback queue's policy is to abort.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(
        &self,
        chunk: &Chunk,
        options: &SynthesisOptions,
    ) -> Result<AudioClip, SynthesisError>;
}
