use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use nk_core::storage::{ArticleQuery, NewsStore};
use nk_core::{CategoryCount, ClassifiedArticle, Result};

#[derive(Default)]
struct MemoryInner {
    articles: Vec<ClassifiedArticle>,
    counts: Vec<CategoryCount>,
}

/// In-memory store with the same upsert/recompute semantics as the SQLite
/// backend. Used in tests and for dry runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NewsStore for MemoryStore {
    async fn upsert_batch(&self, articles: &[ClassifiedArticle]) -> Result<u64> {
        let mut inner = self.inner.write().await;
        for article in articles {
            match inner.articles.iter_mut().find(|a| a.link == article.link) {
                Some(existing) => *existing = article.clone(),
                None => inner.articles.push(article.clone()),
            }
        }
        Ok(articles.len() as u64)
    }

    async fn recompute_category_counts(&self) -> Result<Vec<CategoryCount>> {
        let mut inner = self.inner.write().await;
        let mut tally: BTreeMap<String, i64> = BTreeMap::new();
        for article in &inner.articles {
            for category in &article.categories {
                *tally.entry(category.clone()).or_insert(0) += 1;
            }
        }
        let counts: Vec<CategoryCount> = tally
            .into_iter()
            .map(|(category, article_count)| CategoryCount {
                category,
                article_count,
            })
            .collect();
        inner.counts = counts.clone();
        Ok(counts)
    }

    async fn category_counts(&self) -> Result<Vec<CategoryCount>> {
        let inner = self.inner.read().await;
        Ok(inner.counts.clone())
    }

    async fn query(&self, filter: &ArticleQuery) -> Result<Vec<ClassifiedArticle>> {
        let inner = self.inner.read().await;
        let mut matches: Vec<ClassifiedArticle> = inner
            .articles
            .iter()
            .filter(|a| filter.from.map_or(true, |from| a.published >= from))
            .filter(|a| filter.to.map_or(true, |to| a.published <= to))
            .filter(|a| {
                filter
                    .category
                    .as_ref()
                    .map_or(true, |c| a.categories.contains(c))
            })
            .filter(|a| {
                filter.search.as_ref().map_or(true, |s| {
                    let needle = s.to_lowercase();
                    a.title.to_lowercase().contains(&needle)
                        || a.summary.to_lowercase().contains(&needle)
                })
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.published.cmp(&a.published));
        Ok(matches)
    }
}
