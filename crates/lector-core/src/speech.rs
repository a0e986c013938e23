//! Core speech data types: what gets spoken, in what pieces, and what
//! comes back from the synthesizer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Audio container formats the synthesis service can produce.
///
/// Serializes to the service's wire names (`"MP3"`, `"OGG_OPUS"`,
/// `"LINEAR16"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    Mp3,
    OggOpus,
    Linear16,
}

impl AudioEncoding {
    /// Conventional file extension for clips in this encoding.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::OggOpus => "ogg",
            Self::Linear16 => "wav",
        }
    }

    /// MIME type of the container the service returns. LINEAR16 arrives
    /// wrapped in a WAV header, hence `audio/wav` rather than `audio/l16`.
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::OggOpus => "audio/ogg",
            Self::Linear16 => "audio/wav",
        }
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mp3 => "MP3",
            Self::OggOpus => "OGG_OPUS",
            Self::Linear16 => "LINEAR16",
        };
        f.write_str(name)
    }
}

/// Error for [`AudioEncoding::from_str`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown audio encoding `{0}` (expected mp3, ogg_opus, or linear16)")]
pub struct UnknownEncoding(String);

impl FromStr for AudioEncoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "ogg_opus" | "ogg-opus" | "ogg" | "opus" => Ok(Self::OggOpus),
            "linear16" | "wav" => Ok(Self::Linear16),
            _ => Err(UnknownEncoding(s.to_string())),
        }
    }
}

/// How a chunk's text should be interpreted by the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechKind {
    /// Plain prose.
    Plain,
    /// An SSML fragment. Never split inside an element.
    Markup,
}

/// One bounded slice of an utterance, ready for synthesis.
///
/// Chunks are contiguous slices of the original text: concatenating `text`
/// in `index` order reproduces the utterance byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position within the utterance, starting at 0.
    pub index: usize,
    pub kind: SpeechKind,
    pub text: String,
}

impl Chunk {
    pub fn new(index: usize, kind: SpeechKind, text: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            text: text.into(),
        }
    }

    pub fn is_markup(&self) -> bool {
        matches!(self.kind, SpeechKind::Markup)
    }
}

/// A single read-aloud or download request.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    pub encoding: AudioEncoding,
}

impl Utterance {
    pub fn new(text: impl Into<String>, encoding: AudioEncoding) -> Self {
        Self {
            text: text.into(),
            encoding,
        }
    }
}

/// Encoded audio produced from exactly one chunk (or concatenated for a
/// whole download).
#[derive(Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub encoding: AudioEncoding,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, encoding: AudioEncoding) -> Self {
        Self { bytes, encoding }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Manual Debug: clips can be hundreds of kilobytes and would drown logs.
impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("bytes", &self.bytes.len())
            .field("encoding", &self.encoding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_wire_names_match_the_service_dialect() {
        let json = serde_json::to_string(&AudioEncoding::OggOpus).unwrap();
        assert_eq!(json, "\"OGG_OPUS\"");
        assert_eq!(
            serde_json::to_string(&AudioEncoding::Mp3).unwrap(),
            "\"MP3\""
        );
        assert_eq!(
            serde_json::to_string(&AudioEncoding::Linear16).unwrap(),
            "\"LINEAR16\""
        );
    }

    #[test]
    fn encoding_parses_common_spellings() {
        assert_eq!("mp3".parse::<AudioEncoding>().unwrap(), AudioEncoding::Mp3);
        assert_eq!(
            "OGG_OPUS".parse::<AudioEncoding>().unwrap(),
            AudioEncoding::OggOpus
        );
        assert_eq!(
            "wav".parse::<AudioEncoding>().unwrap(),
            AudioEncoding::Linear16
        );
        assert!("flac".parse::<AudioEncoding>().is_err());
    }

    #[test]
    fn encoding_extension_round_trips_through_display() {
        assert_eq!(AudioEncoding::Mp3.extension(), "mp3");
        assert_eq!(AudioEncoding::OggOpus.to_string(), "OGG_OPUS");
        assert_eq!(AudioEncoding::Linear16.mime(), "audio/wav");
    }

    #[test]
    fn clip_debug_does_not_dump_payload() {
        let clip = AudioClip::new(vec![0u8; 4096], AudioEncoding::Mp3);
        let shown = format!("{clip:?}");
        assert!(shown.contains("4096"));
        assert!(shown.len() < 100);
    }
}
