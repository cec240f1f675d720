use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{CategoryCount, ClassifiedArticle};
use crate::Result;

/// Read-side filter over the persisted set. All fields are optional and
/// combine conjunctively.
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    /// Inclusive lower bound on `published`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `published`.
    pub to: Option<DateTime<Utc>>,
    /// Keep only articles whose category set contains this label.
    pub category: Option<String>,
    /// Case-insensitive substring match over title or summary.
    pub search: Option<String>,
}

#[async_trait]
pub trait NewsStore: Send + Sync {
    /// Upsert a batch of classified articles keyed by link, in a single
    /// transaction. Returns the number of rows affected; a failed batch
    /// affects zero rows.
    async fn upsert_batch(&self, articles: &[ClassifiedArticle]) -> Result<u64>;

    /// Recompute the category aggregate from scratch over the persisted set
    /// and atomically replace the stored counts.
    async fn recompute_category_counts(&self) -> Result<Vec<CategoryCount>>;

    /// Read the stored category aggregate.
    async fn category_counts(&self) -> Result<Vec<CategoryCount>>;

    /// Read-only query over persisted articles, newest first.
    async fn query(&self, filter: &ArticleQuery) -> Result<Vec<ClassifiedArticle>>;
}
