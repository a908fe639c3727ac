//! Best-effort news feed ingestion.
//!
//! Each source is fetched at most once per run. A source that fails to fetch
//! or parse is logged and skipped; ingestion itself never fails.

pub mod client;
pub mod parser;

use thiserror::Error;

use crate::corpus::Corpus;
use crate::model::{Model, SourceId};

pub use client::{FeedFetcher, HttpFetcher};
pub use parser::parse_feed;

/// One feed item reduced to plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub summary: String,
}

impl FeedItem {
    /// Text used for keyword matching: title and summary joined by a space.
    pub fn text(&self) -> String {
        match (self.title.is_empty(), self.summary.is_empty()) {
            (_, true) => self.title.clone(),
            (true, false) => self.summary.clone(),
            (false, false) => format!("{} {}", self.title, self.summary),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed returned HTTP {0}")]
    Status(u16),

    #[error("Malformed feed XML: {0}")]
    Xml(String),
}

/// Fetch and parse every source in `sources`, collecting items into a corpus
/// tagged by source.
pub fn ingest(model: &Model, sources: &[SourceId], fetcher: &impl FeedFetcher) -> Corpus {
    let mut corpus = Corpus::new();
    for &id in sources {
        let source = model.source(id);
        let items = fetcher
            .fetch(source)
            .and_then(|body| parse_feed(source.kind, &body));
        match items {
            Ok(items) => {
                log::debug!("Feed '{}': {} items", source.name, items.len());
                for item in items {
                    let text = item.text();
                    if !text.is_empty() {
                        corpus.push(id, text);
                    }
                }
            }
            Err(e) => log::warn!("Skipping feed '{}' ({}): {}", source.name, source.url, e),
        }
    }
    log::info!("Ingested {} documents from {} sources", corpus.len(), sources.len());
    corpus
}
