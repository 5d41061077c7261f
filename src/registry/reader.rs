use std::sync::Arc;

use tracing::warn;

use crate::error::SourceError;
use crate::registry::models::RegistryEntry;
use crate::sources::RegistrySource;

/// Reads the registry sheet and exposes only the active boxes, in registry
/// row order. That order is load-bearing downstream: it breaks the tie for
/// "first payment instructions wins" and fixes the summary breakdown order.
pub struct RegistryReader {
    source: Arc<dyn RegistrySource>,
}

impl RegistryReader {
    pub fn new(source: Arc<dyn RegistrySource>) -> Self {
        Self { source }
    }

    /// Full registry fetch, filtered to active entries. A failed fetch is
    /// retryable and must abort the surrounding request or poll cycle
    /// without touching durable state.
    pub async fn list_active_boxes(&self) -> Result<Vec<RegistryEntry>, SourceError> {
        let rows = self.source.list_all().await?;

        let mut entries = Vec::new();
        let mut skipped = 0usize;
        for row in &rows {
            match RegistryEntry::from_raw(row) {
                Some(entry) if entry.active => entries.push(entry),
                Some(_) => {}
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("Registry contained {} rows without name/location", skipped);
        }

        Ok(entries)
    }
}
