//! HTTP page fetcher.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONNECTION, LOCATION, REFERER, USER_AGENT};
use tracing::instrument;
use url::Url;

use keyscore_core::error::FetchError;
use keyscore_core::traits::{PageFetcher, BROWSER_USER_AGENT, DEFAULT_REFERER};

/// Redirects followed before giving up.
pub const MAX_REDIRECTS: usize = 5;
/// Deadline for a whole fetch, redirects included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Fetches answer-key pages over HTTP the way a browser would.
///
/// Redirects are followed by hand so the browser headers go out on every
/// hop; `reqwest`'s own redirect handling is disabled.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
    referer: String,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_headers(BROWSER_USER_AGENT, DEFAULT_REFERER)
    }

    /// A fetcher that sends the given `User-Agent` and `Referer`.
    pub fn with_headers(user_agent: &str, referer: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
            referer: referer.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Replace the overall deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn follow_redirects(&self, start: Url) -> Result<String, FetchError> {
        let mut current = start;
        for attempt in 1..=MAX_REDIRECTS {
            tracing::debug!("attempt {attempt}: GET {current}");
            let response = self
                .client
                .get(current.clone())
                .header(USER_AGENT, &self.user_agent)
                .header(ACCEPT, BROWSER_ACCEPT)
                .header(ACCEPT_LANGUAGE, BROWSER_ACCEPT_LANGUAGE)
                .header(CONNECTION, "keep-alive")
                .header("Upgrade-Insecure-Requests", "1")
                .header(REFERER, &self.referer)
                .send()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;

            let status = response.status();
            if REDIRECT_STATUSES.contains(&status.as_u16()) {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or(FetchError::MissingLocation {
                        status: status.as_u16(),
                    })?;
                current = current
                    .join(location)
                    .map_err(|e| FetchError::InvalidUrl(format!("{location}: {e}")))?;
                tracing::debug!("redirected ({status}) to {current}");
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or_default().to_string(),
                });
            }

            return response
                .text()
                .await
                .map_err(|e| FetchError::Network(e.to_string()));
        }
        Err(FetchError::TooManyRedirects(MAX_REDIRECTS))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let start = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(start.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "{url}: unsupported scheme {}",
                start.scheme()
            )));
        }

        match tokio::time::timeout(self.timeout, self.follow_redirects(start)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("fetch of {url} exceeded {:?}", self.timeout);
                Err(FetchError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new().unwrap()
    }

    #[tokio::test]
    async fn successful_fetch_sends_browser_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/key.html"))
            .and(header("Referer", DEFAULT_REFERER))
            .respond_with(ResponseTemplate::new(200).set_body_string("<table></table>"))
            .expect(1)
            .mount(&server)
            .await;

        let body = fetcher()
            .fetch(&format!("{}/key.html", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<table></table>");

        let requests = server.received_requests().await.unwrap();
        let sent = |name: &str| {
            requests[0]
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        assert_eq!(sent("user-agent").as_deref(), Some(BROWSER_USER_AGENT));
        assert_eq!(sent("accept").as_deref(), Some(BROWSER_ACCEPT));
        assert_eq!(sent("accept-language").as_deref(), Some(BROWSER_ACCEPT_LANGUAGE));
    }

    #[tokio::test]
    async fn relative_redirects_are_followed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/start"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/middle"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/middle"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("Location", format!("{}/final", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/final"))
            .and(header("Referer", DEFAULT_REFERER))
            .respond_with(ResponseTemplate::new(200).set_body_string("done"))
            .mount(&server)
            .await;

        let body = fetcher()
            .fetch(&format!("{}/start", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "done");
    }

    #[tokio::test]
    async fn redirect_without_location_fails() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(307))
            .mount(&server)
            .await;

        let err = fetcher().fetch(&server.uri()).await.unwrap_err();
        assert_eq!(err, FetchError::MissingLocation { status: 307 });
    }

    #[tokio::test]
    async fn redirect_loops_hit_the_cap() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
            .expect(MAX_REDIRECTS as u64)
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch(&format!("{}/loop", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::TooManyRedirects(MAX_REDIRECTS));
        assert!(err.to_string().contains("too many redirects"));
    }

    #[tokio::test]
    async fn error_status_fails() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&server)
            .await;

        let err = fetcher().fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let started = Instant::now();
        let err = fetcher()
            .with_timeout(Duration::from_millis(200))
            .fetch(&server.uri())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn non_http_urls_are_rejected() {
        let err = fetcher().fetch("ftp://example.com/key").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
        let err = fetcher().fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
