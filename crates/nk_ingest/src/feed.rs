use std::path::PathBuf;

use async_trait::async_trait;

use nk_core::{Error, RawEntry, Result};

/// Boundary to the external feed collaborator. Implementations hand over
/// already-fetched raw entries; polling and parsing live outside the pipeline.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Name of the feed source, for logging.
    fn name(&self) -> &str;

    /// Produce one batch of raw entries.
    async fn fetch(&self) -> Result<Vec<RawEntry>>;
}

/// Feed source backed by a JSON file holding an array of raw entries.
pub struct JsonFeed {
    path: PathBuf,
}

impl JsonFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeedSource for JsonFeed {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn fetch(&self) -> Result<Vec<RawEntry>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Ingest(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let entries: Vec<RawEntry> = serde_json::from_str(&raw)?;
        Ok(entries)
    }
}
