//! Batched publishing.
//!
//! The server buffers created objects until an explicit publish commits
//! them. The batcher counts successful creations and publishes every
//! `threshold` objects; each pass ends with a forced publish so a pass
//! never leaves uncommitted work behind. A failed publish keeps the
//! counter, so the next successful creation retries it.

use polimport_api::MgmtClient;
use tracing::{info, warn};

/// Counts created/merged objects and triggers threshold publishes.
#[derive(Debug)]
pub struct PublishBatcher {
    threshold: u32,
    counter: u32,
}

impl PublishBatcher {
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            counter: 0,
        }
    }

    /// Record one successful creation/merge and publish if the threshold
    /// is reached.
    pub async fn record(&mut self, client: &MgmtClient) {
        self.counter += 1;
        if self.counter >= self.threshold {
            self.publish(client).await;
        }
    }

    /// Unconditional publish at a checkpoint (pass end, package created).
    pub async fn flush(&mut self, client: &MgmtClient) {
        self.publish(client).await;
    }

    /// Pending creations not yet committed.
    #[must_use]
    pub fn pending(&self) -> u32 {
        self.counter
    }

    async fn publish(&mut self, client: &MgmtClient) {
        info!(pending = self.counter, "publishing to database");
        match client.publish().await {
            Ok(()) => {
                self.counter = 0;
                info!("publish is completed");
            }
            Err(e) => {
                // Counter intentionally kept: the next successful write
                // re-triggers a publish attempt.
                warn!(error = %e, pending = self.counter, "publish failed");
            }
        }
    }
}
