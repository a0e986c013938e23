//! Shared handle to the lazily created audio sink.

use std::sync::Arc;

use lector_core::{AudioSink, SinkError, SinkFactory};
use tokio::sync::Mutex;

/// Lazily created audio sink, shared by every session.
///
/// The slot lock is held across creation, so concurrent first users wait
/// for a single creation instead of racing to open several devices. A
/// failed creation leaves the slot empty and the next caller retries.
pub struct SharedSink {
    factory: Arc<dyn SinkFactory>,
    slot: Mutex<Option<Arc<dyn AudioSink>>>,
}

impl SharedSink {
    pub fn new(factory: Arc<dyn SinkFactory>) -> Self {
        Self {
            factory,
            slot: Mutex::new(None),
        }
    }

    /// The sink, creating it on first use.
    pub async fn get(&self) -> Result<Arc<dyn AudioSink>, SinkError> {
        let mut slot = self.slot.lock().await;
        if let Some(sink) = slot.as_ref() {
            return Ok(Arc::clone(sink));
        }
        let sink = self.factory.create().await?;
        *slot = Some(Arc::clone(&sink));
        Ok(sink)
    }

    /// The sink only if one already exists. Stopping playback must not
    /// conjure a device into existence.
    pub async fn get_if_created(&self) -> Option<Arc<dyn AudioSink>> {
        self.slot.lock().await.as_ref().map(Arc::clone)
    }
}
