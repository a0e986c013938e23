#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

mod client;
mod transport;
mod usage;
mod wire;

pub use client::{DEFAULT_ENDPOINT, TtsClient};
pub use transport::{HttpTransport, ReqwestTransport, TransportReply};
pub use usage::HttpUsageReporter;
