use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use nk_core::{CanonicalArticle, RawEntry};

pub mod feed;

pub use feed::{FeedSource, JsonFeed};

/// Date formats observed across feed sources, tried in order. Zoned formats
/// are normalized to UTC; zone-less formats are assumed to already be UTC.
const NAIVE_DATE_FORMATS: &[&str] = &[
    // Mon, 01 Jan 2024 12:30:00
    "%a, %d %b %Y %H:%M:%S",
    // 2024-01-01 12:30:00
    "%Y-%m-%d %H:%M:%S",
];

/// Fallback for unparseable or missing publication dates. A fixed sentinel
/// keeps canonicalization deterministic; "now" would not be.
fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    // RFC 2822 covers the common RSS form, including "GMT" and numeric offsets.
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Normalize one raw feed entry into a canonical article. Total: missing
/// fields become empty strings and unparseable dates become the epoch
/// sentinel, so this never fails.
pub fn canonicalize(entry: RawEntry) -> CanonicalArticle {
    let title = entry.title.unwrap_or_default();
    let summary = entry.summary.unwrap_or_default();
    let link = entry.link.unwrap_or_default();

    let published = match entry.published.as_deref() {
        Some(raw) => parse_feed_date(raw).unwrap_or_else(|| {
            debug!(link = %link, date = %raw, "unparseable publication date, using epoch sentinel");
            epoch()
        }),
        None => epoch(),
    };

    CanonicalArticle {
        title,
        summary,
        link,
        published,
    }
}

/// Drop articles with neither title nor summary text. Empty text cannot be
/// meaningfully vectorized, so these are excluded before classification.
pub fn filter_classifiable(articles: Vec<CanonicalArticle>) -> Vec<CanonicalArticle> {
    let total = articles.len();
    let kept: Vec<CanonicalArticle> = articles.into_iter().filter(|a| a.has_text()).collect();
    if kept.len() < total {
        debug!(
            skipped = total - kept.len(),
            "excluded articles with no classifiable text"
        );
    }
    kept
}
