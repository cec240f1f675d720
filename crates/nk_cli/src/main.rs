use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use tracing::{error, info, Level};

use nk_classify::{ClassificationPipeline, ModelArtifact, DEFAULT_THRESHOLD};
use nk_core::types::{format_published, parse_published};
use nk_core::{ArticleQuery, Error, NewsStore, Result};
use nk_ingest::{FeedSource, JsonFeed};
use nk_storage::{MemoryStore, SqliteStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "Classify news-feed entries and persist them", long_about = None)]
struct Cli {
    /// Storage backend: sqlite or memory
    #[arg(long, default_value = "sqlite")]
    storage: String,
    /// Path to the SQLite database
    #[arg(long, default_value = "news.db")]
    db: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Classify a batch of raw feed entries and upsert the results
    Ingest {
        /// JSON file holding an array of raw feed entries
        input: PathBuf,
        /// Trained model artifact (vocabulary + classifier)
        #[arg(long)]
        model: PathBuf,
        /// Probability threshold for category assignment
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f32,
    },
    /// Show the persisted per-category article counts
    Counts,
    /// Query persisted articles
    Query {
        /// Inclusive lower bound, e.g. 2024-01-01 or "2024-01-01 12:00:00"
        #[arg(long)]
        from: Option<String>,
        /// Inclusive upper bound
        #[arg(long)]
        to: Option<String>,
        /// Keep only articles carrying this category
        #[arg(long)]
        category: Option<String>,
        /// Substring match over title and summary
        #[arg(long)]
        search: Option<String>,
    },
}

async fn make_store(cli: &Cli) -> Result<Arc<dyn NewsStore>> {
    match cli.storage.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "sqlite" => Ok(Arc::new(SqliteStore::open(&cli.db).await?)),
        other => Err(Error::Storage(format!(
            "unknown storage backend: {}",
            other
        ))),
    }
}

fn parse_bound(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = parse_published(raw) {
        return Ok(ts);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| Error::Ingest(format!("invalid date {:?}: {}", raw, e)))?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::Ingest(format!("invalid date {:?}", raw)))
}

async fn run_ingest(
    store: Arc<dyn NewsStore>,
    input: PathBuf,
    model: PathBuf,
    threshold: f32,
) -> Result<()> {
    let artifact = Arc::new(ModelArtifact::load(&model)?);
    let pipeline = ClassificationPipeline::new(artifact).with_threshold(threshold);

    let feed = JsonFeed::new(input);
    let entries = feed.fetch().await?;
    info!(entries = entries.len(), source = feed.name(), "fetched raw entries");

    let classified = pipeline.run(entries)?;
    info!(classified = classified.len(), "classified batch");

    match store.upsert_batch(&classified).await {
        Ok(rows) => {
            // The aggregate is only recomputed over committed data.
            let counts = store.recompute_category_counts().await?;
            info!(rows, categories = counts.len(), "batch committed");
            println!("{} articles processed", rows);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "batch rolled back, zero rows affected");
            println!("0 articles processed");
            Err(e)
        }
    }
}

async fn run_counts(store: Arc<dyn NewsStore>) -> Result<()> {
    for count in store.category_counts().await? {
        println!("{}\t{}", count.category, count.article_count);
    }
    Ok(())
}

async fn run_query(
    store: Arc<dyn NewsStore>,
    from: Option<String>,
    to: Option<String>,
    category: Option<String>,
    search: Option<String>,
) -> Result<()> {
    let filter = ArticleQuery {
        from: from.as_deref().map(parse_bound).transpose()?,
        to: to.as_deref().map(parse_bound).transpose()?,
        category,
        search,
    };
    for article in store.query(&filter).await? {
        println!(
            "{}  [{}]  {}  {}",
            format_published(&article.published),
            article.categories.join(", "),
            article.title,
            article.link
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();
    let store = make_store(&cli).await?;

    match cli.command {
        Commands::Ingest {
            input,
            model,
            threshold,
        } => run_ingest(store, input, model, threshold).await,
        Commands::Counts => run_counts(store).await,
        Commands::Query {
            from,
            to,
            category,
            search,
        } => run_query(store, from, to, category, search).await,
    }
}
