//! The synthesis client: builds requests in the service's JSON dialect and
//! maps replies onto the domain error taxonomy.

use crate::transport::{HttpTransport, ReqwestTransport, TransportReply};
use crate::wire;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use lector_core::{
    AudioClip, Chunk, NoopUsageReporter, SynthesisError, SynthesisOptions, Synthesizer,
    UsageEvent, UsageOutcome, UsageReporter,
};
use std::sync::Arc;
use url::Url;

/// Public endpoint of the synthesis service.
pub const DEFAULT_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Remote text-to-speech client.
///
/// One attempt per call, no retries: auth failures are terminal, and the
/// playback queue aborts a session on any other failure anyway.
pub struct TtsClient<T: HttpTransport = ReqwestTransport> {
    transport: T,
    reporter: Arc<dyn UsageReporter>,
    endpoint: Url,
}

impl TtsClient {
    /// Client against the public endpoint, reporting usage to nobody.
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }
}

impl Default for TtsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: HttpTransport> TtsClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            reporter: Arc::new(NoopUsageReporter),
            // Compile-time constant, parsing cannot fail.
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint URL"),
        }
    }

    /// Point the client at a different endpoint (gateways, test servers).
    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Attach a best-effort usage reporter.
    pub fn reporter(mut self, reporter: Arc<dyn UsageReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Endpoint plus the credential as a query parameter. Fails fast with
    /// an auth error when no credential is configured.
    fn request_url(&self, options: &SynthesisOptions) -> Result<Url, SynthesisError> {
        let credential = options
            .credential
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| SynthesisError::Auth {
                message: "no API credential configured".to_string(),
            })?;
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("key", credential);
        Ok(url)
    }

    fn request_body(chunk: &Chunk, options: &SynthesisOptions) -> wire::SynthesizeRequest {
        let input = if chunk.is_markup() {
            wire::SynthesisInput::Ssml(ensure_speak_document(&chunk.text))
        } else {
            wire::SynthesisInput::Text(chunk.text.clone())
        };
        wire::SynthesizeRequest {
            input,
            voice: wire::VoiceSelection {
                language_code: options.language.clone(),
                name: options.voice.clone(),
            },
            audio_config: wire::AudioConfig {
                audio_encoding: options.encoding,
                pitch: options.pitch,
                speaking_rate: options.rate,
                volume_gain_db: options.gain,
                effects_profile_id: options.effects_profile.clone(),
            },
        }
    }

    fn interpret(
        reply: TransportReply,
        options: &SynthesisOptions,
    ) -> Result<AudioClip, SynthesisError> {
        match reply.status {
            200..=299 => {}
            401 | 403 => {
                return Err(SynthesisError::Auth {
                    message: Self::error_message(&reply),
                });
            }
            status => {
                return Err(SynthesisError::Backend {
                    status,
                    message: Self::error_message(&reply),
                });
            }
        }

        let parsed: wire::SynthesizeResponse =
            serde_json::from_slice(&reply.body).map_err(|e| SynthesisError::Backend {
                status: reply.status,
                message: format!("malformed synthesis response: {e}"),
            })?;
        let bytes = BASE64
            .decode(parsed.audio_content.as_bytes())
            .map_err(|e| SynthesisError::Backend {
                status: reply.status,
                message: format!("synthesis payload is not valid base64: {e}"),
            })?;
        Ok(AudioClip::new(bytes, options.encoding))
    }

    /// Prefer the service's structured `error.message`; fall back to a
    /// trimmed body snippet.
    fn error_message(reply: &TransportReply) -> String {
        if let Ok(envelope) = serde_json::from_slice::<wire::ErrorEnvelope>(&reply.body) {
            if !envelope.error.message.is_empty() {
                return envelope.error.message;
            }
        }
        let body = String::from_utf8_lossy(&reply.body);
        let snippet: String = body.trim().chars().take(200).collect();
        if snippet.is_empty() {
            format!("HTTP {}", reply.status)
        } else {
            snippet
        }
    }

    async fn synthesize_once(
        &self,
        chunk: &Chunk,
        options: &SynthesisOptions,
    ) -> Result<AudioClip, SynthesisError> {
        let url = self.request_url(options)?;
        let body = Self::request_body(chunk, options);
        tracing::debug!(
            chunk = chunk.index,
            chars = chunk.text.chars().count(),
            ssml = chunk.is_markup(),
            "requesting synthesis"
        );
        let reply = self
            .transport
            .post_json(&url, &body)
            .await
            .map_err(|source| SynthesisError::Network { source })?;
        tracing::debug!(
            status = reply.status,
            bytes = reply.body.len(),
            "synthesis reply"
        );
        Self::interpret(reply, options)
    }
}

#[async_trait]
impl<T: HttpTransport> Synthesizer for TtsClient<T> {
    async fn synthesize(
        &self,
        chunk: &Chunk,
        options: &SynthesisOptions,
    ) -> Result<AudioClip, SynthesisError> {
        let result = self.synthesize_once(chunk, options).await;
        self.reporter.report(UsageEvent {
            timestamp: Utc::now(),
            encoding: options.encoding,
            ssml: chunk.is_markup(),
            text_chars: chunk.text.chars().count(),
            outcome: match &result {
                Ok(_) => UsageOutcome::Ok,
                Err(error) => UsageOutcome::from(error),
            },
        });
        result
    }
}

/// Rewrap a markup chunk into a standalone `<speak>` document.
///
/// Chunking slices a document between its top-level nodes, so a chunk may
/// carry the original wrapper tags on one side only. Strip whatever
/// remnants are present, then wrap once.
fn ensure_speak_document(markup: &str) -> String {
    format!("<speak>{}</speak>", strip_speak_wrapper(markup))
}

fn strip_speak_wrapper(markup: &str) -> &str {
    let mut inner = markup.trim();
    if inner
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("<speak"))
    {
        let after = &inner[6..];
        // Only a real wrapper tag counts, not an element like <speakable>.
        if after.starts_with('>') || after.starts_with(char::is_whitespace) {
            if let Some(gt) = find_unquoted_gt(after) {
                inner = after[gt + 1..].trim_start();
            }
        }
    }
    if inner.len() >= 8 {
        let tail_start = inner.len() - 8;
        if inner
            .get(tail_start..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case("</speak>"))
        {
            inner = inner[..tail_start].trim_end();
        }
    }
    inner
}

/// Position of the first `>` outside attribute quotes.
fn find_unquoted_gt(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}
