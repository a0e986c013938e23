//! Errors surfaced by playback and download sessions.

use lector_core::SynthesisError;

#[derive(Debug, thiserror::Error)]
pub enum SpeakerError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("nothing to say: the utterance is empty")]
    EmptyUtterance,

    #[error("cancelled")]
    Cancelled,

    #[error("internal playback failure: {0}")]
    Internal(String),
}

/// Short title and detail pair suitable for showing to a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    pub title: String,
    pub detail: String,
}

impl SpeakerError {
    /// Message worth surfacing in a UI, if any. Only credential and
    /// backend rejections are user-facing; every other failure ends the
    /// session quietly beyond returning to idle.
    pub fn user_message(&self) -> Option<UserMessage> {
        match self {
            Self::Synthesis(SynthesisError::Auth { message }) => Some(UserMessage {
                title: "Speech credentials rejected".into(),
                detail: message.clone(),
            }),
            Self::Synthesis(SynthesisError::Backend { status, message }) => Some(UserMessage {
                title: "Speech service error".into(),
                detail: format!("{message} (status {status})"),
            }),
            Self::Synthesis(SynthesisError::Network { .. })
            | Self::EmptyUtterance
            | Self::Cancelled
            | Self::Internal(_) => None,
        }
    }
}
