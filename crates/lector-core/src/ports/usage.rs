//! Best-effort usage reporting port.

use super::synthesizer::SynthesisError;
use crate::speech::AudioEncoding;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What one synthesis attempt looked like.
#[derive(Debug, Clone, Serialize)]
pub struct UsageEvent {
    pub timestamp: DateTime<Utc>,
    pub encoding: AudioEncoding,
    /// True when the chunk went out as a markup document.
    pub ssml: bool,
    /// Characters submitted, the unit the service bills in.
    pub text_chars: usize,
    pub outcome: UsageOutcome,
}

/// Coarse outcome classification for a synthesis attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageOutcome {
    Ok,
    Auth,
    Backend,
    Network,
}

impl From<&SynthesisError> for UsageOutcome {
    fn from(error: &SynthesisError) -> Self {
        match error {
            SynthesisError::Auth { .. } => Self::Auth,
            SynthesisError::Backend { .. } => Self::Backend,
            SynthesisError::Network { .. } => Self::Network,
        }
    }
}

/// Fire-and-forget analytics.
///
/// `report` must return immediately and never surface failures: losing an
/// event is always preferable to delaying or failing speech.
pub trait UsageReporter: Send + Sync {
    fn report(&self, event: UsageEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUsageReporter;

impl UsageReporter for NoopUsageReporter {
    fn report(&self, _event: UsageEvent) {}
}
