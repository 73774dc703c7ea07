//! Periodic feed collection.
//!
//! Each tick picks the single feed fetched longest ago, fetches it, and
//! stores any items whose URL has not been seen before.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::db::{Database, NewPost};
use crate::error::{Error, Result};
use crate::fetcher::{Fetcher, RssItem, PUB_DATE_FORMAT};

/// Outcome of one successful scrape tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeReport {
    pub feed_name: String,
    pub feed_url: String,
    pub items: usize,
    pub new_posts: usize,
}

/// Parse the interval argument of `agg` (`30s`, `1m`, `1h30m`, ...).
pub fn parse_interval(arg: &str) -> Result<Duration> {
    let interval = humantime::parse_duration(arg)?;
    if interval.is_zero() {
        return Err(Error::Usage("interval must be greater than zero".to_string()));
    }
    Ok(interval)
}

/// Parse an RSS `<pubDate>`. Anything not in the expected format yields `None`.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw.trim(), PUB_DATE_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Store `items` as posts of `feed_id` and return how many were new.
///
/// Items whose URL is already stored are skipped. Any other insert failure
/// stops ingestion of the remaining items.
pub async fn ingest_items(db: &Database, feed_id: &str, items: &[RssItem]) -> Result<usize> {
    let mut created = 0;

    for item in items {
        let published_at = item.pub_date.as_deref().and_then(parse_pub_date);
        if published_at.is_none() {
            if let Some(raw) = &item.pub_date {
                debug!("Unparseable pubDate {:?} for {}", raw, item.link);
            }
        }

        let post = NewPost {
            feed_id,
            title: &item.title,
            url: &item.link,
            description: Some(item.description.as_str()).filter(|d| !d.is_empty()),
            published_at,
        };

        match db.create_post(&post).await {
            Ok(_) => created += 1,
            Err(Error::AlreadyExists(_)) => debug!("Already stored: {}", item.link),
            Err(e) => return Err(e),
        }
    }

    Ok(created)
}

pub struct Scraper<'a> {
    db: &'a Database,
    fetcher: &'a Fetcher,
}

impl<'a> Scraper<'a> {
    pub fn new(db: &'a Database, fetcher: &'a Fetcher) -> Self {
        Self { db, fetcher }
    }

    /// Run a single tick against the least recently fetched feed.
    pub async fn scrape_next(&self) -> Result<ScrapeReport> {
        let feed = self
            .db
            .get_next_feed_to_fetch()
            .await?
            .ok_or(Error::NoFeeds)?;

        info!("Fetching feed: {} ({})", feed.name, feed.url);

        let fetched = match self.fetcher.fetch(&feed.url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                // still counts as fetched, or a dead feed would be picked every tick
                if let Err(mark_err) = self
                    .db
                    .mark_feed_fetched(&feed.id, Some(&e.to_string()))
                    .await
                {
                    warn!("Failed to mark feed '{}' fetched: {}", feed.name, mark_err);
                }
                return Err(e);
            }
        };

        self.db.mark_feed_fetched(&feed.id, None).await?;

        let items = fetched.channel.items.len();
        let new_posts = ingest_items(self.db, &feed.id, &fetched.channel.items).await?;

        info!(
            "Stored {} new of {} items for feed '{}'",
            new_posts, items, feed.name
        );

        Ok(ScrapeReport {
            feed_name: feed.name,
            feed_url: feed.url,
            items,
            new_posts,
        })
    }

    /// Scrape one feed per `every` until `cancel` fires.
    ///
    /// The first tick runs immediately. A failing tick is logged and the loop
    /// carries on.
    pub async fn run(&self, every: Duration, cancel: CancellationToken) {
        let mut timer = tokio::time::interval(every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = timer.tick() => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.scrape_next() => {
                    if let Err(e) = result {
                        error!("Scrape failed: {}", e);
                    }
                }
            }
        }

        info!("Feed collection stopped");
    }
}
