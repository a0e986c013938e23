#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod chunker;
mod device;
mod error;
mod sink;
mod speaker;

pub use chunker::{ChunkerConfig, DEFAULT_MAX_CHUNK_CHARS, chunk_text};
pub use device::{DeviceSink, DeviceSinkFactory};
pub use error::{SpeakerError, UserMessage};
pub use sink::SharedSink;
pub use speaker::{Speaker, SpeakerEvent};
