use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Timestamp format shared by ingestion and storage. Timestamps are held as
/// `DateTime<Utc>` in memory and only rendered to this form at the edges.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One entry as produced by the external feed source. Nothing is guaranteed:
/// any field may be missing, empty, or malformed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub published: Option<String>,
}

/// A feed entry after canonicalization. `link` is the identity key; `published`
/// is always a valid UTC timestamp (the ingestion adapter substitutes the
/// epoch sentinel for unparseable dates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalArticle {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub published: DateTime<Utc>,
}

impl CanonicalArticle {
    /// Whether the article carries any classifiable text.
    pub fn has_text(&self) -> bool {
        !self.title.trim().is_empty() || !self.summary.trim().is_empty()
    }

    /// Title and summary joined into the text the classifier sees.
    pub fn classification_text(&self) -> String {
        format!("{} {}", self.title, self.summary)
    }
}

/// A canonical article plus its assigned categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedArticle {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub published: DateTime<Utc>,
    pub categories: Vec<String>,
}

impl ClassifiedArticle {
    pub fn new(article: CanonicalArticle, categories: Vec<String>) -> Self {
        Self {
            title: article.title,
            summary: article.summary,
            link: article.link,
            published: article.published,
            categories,
        }
    }

    /// Structural validation applied before persistence. Failures drop the
    /// record from the batch; they are never fatal.
    pub fn validate(&self) -> Result<()> {
        if self.link.is_empty() {
            return Err(Error::Validation("article has no link".to_string()));
        }
        Url::parse(&self.link).map_err(|e| Error::InvalidUrl(format!("{}: {}", self.link, e)))?;
        if self.categories.is_empty() {
            return Err(Error::Validation(format!(
                "article {} has no categories",
                self.link
            )));
        }
        if self.categories.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::Validation(format!(
                "article {} has a blank category",
                self.link
            )));
        }
        Ok(())
    }
}

/// One row of the derived aggregate: how many persisted articles carry a
/// category. Recomputed wholesale after each committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub article_count: i64,
}

/// Render a timestamp in the canonical edge format.
pub fn format_published(ts: &DateTime<Utc>) -> String {
    ts.format(CANONICAL_FORMAT).to_string()
}

/// Parse a canonical-format timestamp back into `DateTime<Utc>`.
pub fn parse_published(s: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, CANONICAL_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::Storage(format!("invalid stored timestamp {:?}: {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn article(link: &str, categories: &[&str]) -> ClassifiedArticle {
        ClassifiedArticle {
            title: "Brand i centrum".to_string(),
            summary: "En brand utbröt under natten.".to_string(),
            link: link.to_string(),
            published: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_canonical_timestamp_round_trip() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let formatted = format_published(&ts);
        assert_eq!(formatted, "2024-01-01 12:00:00");
        assert_eq!(parse_published(&formatted).unwrap(), ts);
    }

    #[test]
    fn test_validate_accepts_well_formed_article() {
        assert!(article("https://example.com/1", &["Sport"]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_link() {
        assert!(article("not a url", &["Sport"]).validate().is_err());
        assert!(article("", &["Sport"]).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_categories() {
        assert!(article("https://example.com/1", &[]).validate().is_err());
        assert!(article("https://example.com/1", &[" "]).validate().is_err());
    }

    #[test]
    fn test_has_text() {
        let mut a = CanonicalArticle {
            title: String::new(),
            summary: String::new(),
            link: "https://example.com/1".to_string(),
            published: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        assert!(!a.has_text());
        a.summary = "text".to_string();
        assert!(a.has_text());
    }
}
