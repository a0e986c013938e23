#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod ports;
pub mod settings;
pub mod speech;

pub use ports::{
    AudioSink, NoopUsageReporter, SinkError, SinkFactory, SynthesisError, Synthesizer, UsageEvent,
    UsageOutcome, UsageReporter,
};
pub use settings::{
    FixedSettings, SettingsError, SettingsProvider, SpeechSettings, SynthesisOptions,
};
pub use speech::{AudioClip, AudioEncoding, Chunk, SpeechKind, UnknownEncoding, Utterance};
