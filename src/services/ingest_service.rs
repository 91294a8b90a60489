use chrono::Utc;

use crate::domain::{InsertOutcome, NewPost};
use crate::errors::{GatorError, GatorResult};
use crate::feed::{normalize_date, FeedDocument, FeedFetcher, FetchContext};
use crate::storage::traits::{FeedRepository, PostRepository};

/// Counts for one feed's ingestion, used for logging only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub feed_id: i64,
    pub feed_name: String,
    pub items: usize,
    pub stored: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

/// One step of aggregation, as driven by the scheduler.
#[cfg_attr(test, mockall::automock)]
pub trait IngestCycle {
    fn run_cycle(&self, ctx: &FetchContext) -> GatorResult<CycleReport>;
}

pub struct IngestService<F: FeedRepository, P: PostRepository, X: FeedFetcher> {
    feed_repository: F,
    post_repository: P,
    fetcher: X,
}

impl<F: FeedRepository, P: PostRepository, X: FeedFetcher> IngestService<F, P, X> {
    pub fn new(feed_repository: F, post_repository: P, fetcher: X) -> Self {
        Self {
            feed_repository,
            post_repository,
            fetcher,
        }
    }

    /// Poll the stalest feed and store its new posts.
    ///
    /// The feed is marked as fetched before any network work, so a fetch
    /// that hangs or fails still sends the feed to the back of the queue.
    /// Item-level problems are logged and skipped; only feed-level
    /// failures are returned.
    pub fn run_cycle(&self, ctx: &FetchContext) -> GatorResult<CycleReport> {
        let feed = self
            .feed_repository
            .next_to_fetch()?
            .ok_or(GatorError::NoFeeds)?;
        let feed_id = feed
            .id
            .ok_or_else(|| GatorError::FeedNotFound("Feed has no ID".to_string()))?;

        self.feed_repository.mark_fetched(feed_id, Utc::now())?;

        let document = self
            .fetcher
            .fetch(&feed.url, ctx)
            .map_err(|source| GatorError::Fetch {
                url: feed.url.clone(),
                source,
            })?;

        let report = self.ingest(feed_id, &feed.name, &document);

        tracing::info!(
            feed_id,
            feed = %feed.name,
            items = report.items,
            stored = report.stored,
            duplicates = report.duplicates,
            skipped = report.skipped,
            "Fetched {} posts from feed: {}",
            report.items,
            feed.name
        );

        Ok(report)
    }

    /// Store every item of `document` that has a usable date and link,
    /// in document order. Re-ingesting the same document stores nothing new.
    pub fn ingest(&self, feed_id: i64, feed_name: &str, document: &FeedDocument) -> CycleReport {
        let mut report = CycleReport {
            feed_id,
            feed_name: feed_name.to_string(),
            items: document.items.len(),
            ..Default::default()
        };

        for (index, item) in document.items.iter().enumerate() {
            if item.link.trim().is_empty() {
                tracing::warn!(
                    feed_id,
                    item = index + 1,
                    title = %item.title,
                    "Skipping item without link"
                );
                report.skipped += 1;
                continue;
            }

            let published_at = match normalize_date(&item.pub_date) {
                Ok(published_at) => published_at,
                Err(e) => {
                    tracing::warn!(
                        feed_id,
                        item = index + 1,
                        link = %item.link,
                        error = %e,
                        "Skipping item with unparseable date"
                    );
                    report.skipped += 1;
                    continue;
                }
            };

            let post = NewPost::from_item(feed_id, item, published_at);
            match self.post_repository.insert(&post) {
                Ok(InsertOutcome::Inserted) => report.stored += 1,
                Ok(InsertOutcome::AlreadyExists) => report.duplicates += 1,
                Err(e) => {
                    tracing::warn!(feed_id, link = %item.link, error = %e, "Failed to insert post");
                    report.skipped += 1;
                }
            }
        }

        report
    }
}

impl<F: FeedRepository, P: PostRepository, X: FeedFetcher> IngestCycle for IngestService<F, P, X> {
    fn run_cycle(&self, ctx: &FetchContext) -> GatorResult<CycleReport> {
        IngestService::run_cycle(self, ctx)
    }
}
