//! Core trait definitions for page fetchers.
//!
//! The async [`PageFetcher`] trait is implemented by the `keyscore-fetch`
//! crate; the extractor only depends on this abstraction.

use async_trait::async_trait;

use crate::error::FetchError;

/// Browser user agent sent with every fetch; answer-key hosts reject
/// non-browser clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Referer sent with every fetch.
pub const DEFAULT_REFERER: &str = "https://ssc.digialm.com/";

/// Trait for backends that retrieve the raw HTML of an answer-key page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Human-readable fetcher name (e.g. "http").
    fn name(&self) -> &str;

    /// Fetch the page body at `url`, following redirects.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Serves one canned response for every URL and counts calls.
    pub(crate) struct StaticFetcher {
        page: Result<String, FetchError>,
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        pub(crate) fn new(page: Result<String, FetchError>) -> Self {
            Self {
                page,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.page.clone()
        }
    }
}
