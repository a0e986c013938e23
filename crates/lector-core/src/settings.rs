//! User-facing speech settings and the provider boundary they arrive
//! through.
//!
//! The engine reads a full snapshot once per request and never writes one
//! back. Storage, migration, and UI editing of these values belong to the
//! embedding application.

use crate::speech::AudioEncoding;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Speaking rate multiplier accepted by the synthesis service.
pub const RATE_RANGE: (f64, f64) = (0.25, 4.0);
/// Pitch offset in semitones accepted by the synthesis service.
pub const PITCH_RANGE: (f64, f64) = (-20.0, 20.0);
/// Volume gain in dB accepted by the synthesis service.
pub const GAIN_RANGE: (f64, f64) = (-96.0, 16.0);

/// Flat snapshot of the speech settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// API credential for the synthesis service. `None` fails with an auth
    /// error on first use rather than at construction.
    pub credential: Option<String>,
    /// Voice name, e.g. `en-US-Wavenet-D`.
    pub voice: String,
    /// BCP-47 language tag, e.g. `en-US`.
    pub language: String,
    /// Default encoding for playback and downloads.
    pub encoding: AudioEncoding,
    /// Pitch offset in semitones.
    pub pitch: f64,
    /// Speaking rate multiplier.
    pub rate: f64,
    /// Volume gain in dB.
    pub gain: f64,
    /// Server-side audio effects profiles, applied in order.
    pub effects_profile: Vec<String>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            credential: None,
            voice: "en-US-Standard-C".to_string(),
            language: "en-US".to_string(),
            encoding: AudioEncoding::Mp3,
            pitch: 0.0,
            rate: 1.0,
            gain: 0.0,
            effects_profile: Vec::new(),
        }
    }
}

impl SpeechSettings {
    /// Check every field against the ranges the service accepts.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.voice.trim().is_empty() {
            return Err(SettingsError::EmptyField("voice"));
        }
        if self.language.trim().is_empty() {
            return Err(SettingsError::EmptyField("language"));
        }
        Self::check_range("rate", self.rate, RATE_RANGE)?;
        Self::check_range("pitch", self.pitch, PITCH_RANGE)?;
        Self::check_range("gain", self.gain, GAIN_RANGE)?;
        Ok(())
    }

    fn check_range(
        field: &'static str,
        value: f64,
        (min, max): (f64, f64),
    ) -> Result<(), SettingsError> {
        if value.is_finite() && (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(SettingsError::OutOfRange {
                field,
                min,
                max,
                value,
            })
        }
    }

    /// Freeze this snapshot into per-request synthesis options, using
    /// `encoding` in place of the configured default.
    pub fn options_for(&self, encoding: AudioEncoding) -> SynthesisOptions {
        SynthesisOptions {
            credential: self.credential.clone(),
            voice: self.voice.clone(),
            language: self.language.clone(),
            encoding,
            pitch: self.pitch,
            rate: self.rate,
            gain: self.gain,
            effects_profile: self.effects_profile.clone(),
        }
    }
}

/// A settings snapshot failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("{field} must be within {min}..={max} (got {value})")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// Per-request synthesis parameters, frozen when a session starts.
///
/// Sessions keep the options they started with even if the live settings
/// change mid-playback.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOptions {
    pub credential: Option<String>,
    pub voice: String,
    pub language: String,
    pub encoding: AudioEncoding,
    pub pitch: f64,
    pub rate: f64,
    pub gain: f64,
    pub effects_profile: Vec<String>,
}

/// Read-only source of the current speech settings.
pub trait SettingsProvider: Send + Sync {
    /// Cheap, non-blocking snapshot of the settings as of now.
    fn snapshot(&self) -> SpeechSettings;
}

/// Fixed in-memory settings, for CLIs and tests.
#[derive(Debug, Clone, Default)]
pub struct FixedSettings(SpeechSettings);

impl FixedSettings {
    pub fn new(settings: SpeechSettings) -> Self {
        Self(settings)
    }
}

impl SettingsProvider for FixedSettings {
    fn snapshot(&self) -> SpeechSettings {
        self.0.clone()
    }
}
