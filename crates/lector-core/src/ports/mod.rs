//! Port definitions (trait abstractions) for the engine's collaborators.
//!
//! Ports define what the speech engine expects from infrastructure: a
//! synthesis service, an audio output surface, and an analytics sink. They
//! use only domain types so adapters can live in separate crates.

pub mod sink;
pub mod synthesizer;
pub mod usage;

pub use sink::{AudioSink, SinkError, SinkFactory};
pub use synthesizer::{SynthesisError, Synthesizer};
pub use usage::{NoopUsageReporter, UsageEvent, UsageOutcome, UsageReporter};
