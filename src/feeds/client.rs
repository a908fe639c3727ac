//! HTTP transport for feed sources.

use reqwest::blocking::Client;

use crate::model::Source;

use super::FeedError;

const USER_AGENT: &str = concat!("worldpam/", env!("CARGO_PKG_VERSION"));

/// Fetches the raw body of a feed source.
pub trait FeedFetcher {
    fn fetch(&self, source: &Source) -> Result<Vec<u8>, FeedError>;
}

/// Blocking HTTP fetcher. One client is shared across every source in a run;
/// each request carries its source's own timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FeedError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

impl FeedFetcher for HttpFetcher {
    fn fetch(&self, source: &Source) -> Result<Vec<u8>, FeedError> {
        log::debug!("Fetching feed '{}' from {}", source.name, source.url);
        let resp = self
            .client
            .get(&source.url)
            .timeout(source.timeout)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }
        Ok(resp.bytes()?.to_vec())
    }
}
