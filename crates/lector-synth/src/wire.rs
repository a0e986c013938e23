//! Serde models for the synthesis service's JSON dialect.

use lector_core::AudioEncoding;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SynthesizeRequest {
    pub input: SynthesisInput,
    pub voice: VoiceSelection,
    pub audio_config: AudioConfig,
}

/// Externally tagged: `{"text": ...}` or `{"ssml": ...}`.
#[derive(Debug, Serialize)]
pub(crate) enum SynthesisInput {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "ssml")]
    Ssml(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VoiceSelection {
    pub language_code: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AudioConfig {
    pub audio_encoding: AudioEncoding,
    pub pitch: f64,
    pub speaking_rate: f64,
    pub volume_gain_db: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub effects_profile_id: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SynthesizeResponse {
    pub audio_content: String,
}

/// Error bodies arrive as `{"error": {"message": ..., ...}}`. Only the
/// message is surfaced; code and status duplicate the HTTP layer.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}
