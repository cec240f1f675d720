use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use tracing::debug;

use nk_core::storage::{ArticleQuery, NewsStore};
use nk_core::types::{format_published, parse_published};
use nk_core::{CategoryCount, ClassifiedArticle, Error, Result};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS news (
        title TEXT NOT NULL,
        summary TEXT NOT NULL,
        link TEXT PRIMARY KEY,
        published TEXT NOT NULL,
        topic TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS category_counts (
        category TEXT PRIMARY KEY,
        article_count INTEGER NOT NULL
    )
    "#,
];

/// SQLite-backed store. The `topic` column holds the JSON-encoded category
/// list; encoding and decoding happen only here, at the storage edge.
pub struct SqliteStore {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

impl SqliteStore {
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("failed to open {}: {}", db_path.display(), e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn decode_row(row: &sqlx::sqlite::SqliteRow) -> Result<ClassifiedArticle> {
        let topic: String = row.get("topic");
        let categories: Vec<String> = serde_json::from_str(&topic)?;
        Ok(ClassifiedArticle {
            title: row.get("title"),
            summary: row.get("summary"),
            link: row.get("link"),
            published: parse_published(row.get::<&str, _>("published"))?,
            categories,
        })
    }
}

#[async_trait]
impl NewsStore for SqliteStore {
    async fn upsert_batch(&self, articles: &[ClassifiedArticle]) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Storage(format!("failed to begin transaction: {}", e)))?;

        let mut affected = 0u64;
        for article in articles {
            let topic = serde_json::to_string(&article.categories)?;
            let result = sqlx::query(
                r#"
                INSERT INTO news (title, summary, link, published, topic)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(link) DO UPDATE SET
                    title = excluded.title,
                    summary = excluded.summary,
                    published = excluded.published,
                    topic = excluded.topic
                "#,
            )
            .bind(&article.title)
            .bind(&article.summary)
            .bind(&article.link)
            .bind(format_published(&article.published))
            .bind(topic)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Storage(format!("failed to upsert {}: {}", article.link, e)))?;
            affected += result.rows_affected();
        }

        // Dropping the transaction without this commit rolls the whole batch
        // back, so a failed batch affects zero rows.
        tx.commit()
            .await
            .map_err(|e| Error::Storage(format!("failed to commit batch: {}", e)))?;
        debug!(rows = affected, "committed batch");
        Ok(affected)
    }

    async fn recompute_category_counts(&self) -> Result<Vec<CategoryCount>> {
        let rows = sqlx::query("SELECT topic FROM news")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to read topics: {}", e)))?;

        let mut tally: BTreeMap<String, i64> = BTreeMap::new();
        for row in rows {
            let topic: String = row.get("topic");
            let categories: Vec<String> = serde_json::from_str(&topic)?;
            for category in categories {
                *tally.entry(category).or_insert(0) += 1;
            }
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Storage(format!("failed to begin transaction: {}", e)))?;
        sqlx::query("DELETE FROM category_counts")
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Storage(format!("failed to clear counts: {}", e)))?;
        for (category, article_count) in &tally {
            sqlx::query("INSERT INTO category_counts (category, article_count) VALUES (?, ?)")
                .bind(category)
                .bind(article_count)
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::Storage(format!("failed to insert count: {}", e)))?;
        }
        tx.commit()
            .await
            .map_err(|e| Error::Storage(format!("failed to commit counts: {}", e)))?;

        Ok(tally
            .into_iter()
            .map(|(category, article_count)| CategoryCount {
                category,
                article_count,
            })
            .collect())
    }

    async fn category_counts(&self) -> Result<Vec<CategoryCount>> {
        let rows =
            sqlx::query("SELECT category, article_count FROM category_counts ORDER BY category")
                .fetch_all(&*self.pool)
                .await
                .map_err(|e| Error::Storage(format!("failed to read counts: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| CategoryCount {
                category: row.get("category"),
                article_count: row.get("article_count"),
            })
            .collect())
    }

    async fn query(&self, filter: &ArticleQuery) -> Result<Vec<ClassifiedArticle>> {
        let mut builder = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            "SELECT title, summary, link, published, topic FROM news WHERE 1 = 1",
        );
        if let Some(from) = &filter.from {
            builder.push(" AND published >= ");
            builder.push_bind(format_published(from));
        }
        if let Some(to) = &filter.to {
            builder.push(" AND published <= ");
            builder.push_bind(format_published(to));
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search.to_lowercase());
            builder.push(" AND (LOWER(title) LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR LOWER(summary) LIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
        builder.push(" ORDER BY published DESC");

        let rows = builder
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to query articles: {}", e)))?;

        // Category membership is checked after decoding: the JSON topic
        // column is opaque to SQL.
        let mut articles = Vec::with_capacity(rows.len());
        for row in &rows {
            let article = Self::decode_row(row)?;
            if let Some(category) = &filter.category {
                if !article.categories.contains(category) {
                    continue;
                }
            }
            articles.push(article);
        }
        Ok(articles)
    }
}
