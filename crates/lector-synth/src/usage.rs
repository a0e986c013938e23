//! HTTP usage reporting adapter.

use lector_core::{UsageEvent, UsageReporter};
use url::Url;

/// POSTs one JSON event per synthesis attempt to a collector endpoint.
///
/// Every failure is swallowed at debug level: losing an event must never
/// slow down or fail speech. `report` spawns onto the ambient tokio
/// runtime, so it has to be called from within one.
#[derive(Debug, Clone)]
pub struct HttpUsageReporter {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpUsageReporter {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

impl UsageReporter for HttpUsageReporter {
    fn report(&self, event: UsageEvent) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        tokio::spawn(async move {
            match client.post(endpoint).json(&event).send().await {
                Ok(reply) if !reply.status().is_success() => {
                    tracing::debug!(status = reply.status().as_u16(), "usage report rejected");
                }
                Ok(_) => {}
                Err(error) => tracing::debug!(%error, "usage report failed"),
            }
        });
    }
}
