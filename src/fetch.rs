//! Single bounded page fetch shared by the redirect and content checks.
//!
//! Redirects are followed by hand so the number of hops is known. The chain
//! is followed up to the larger of the redirect-check cap and the content
//! cap; the redirect check then judges the hop count against its own cap
//! while the content scan still gets the page.

use crate::config::FetchConfig;
use crate::error::FetchError;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// What one GET produced: where the redirect chain ended and the page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub final_url: Url,
    pub status: u16,
    /// Redirect hops followed to reach `final_url`.
    pub redirects: usize,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    timeout: Duration,
    max_redirects: usize,
    follow_cap: usize,
}

impl PageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            timeout,
            max_redirects: config.max_redirects,
            follow_cap: config.max_redirects.max(config.content_max_redirects),
        })
    }

    /// Hops the redirect check tolerates before calling a URL unsafe.
    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    /// GET `url`, following redirects up to the larger configured cap, all
    /// within one timeout. A non-2xx final response counts as a failed fetch.
    pub async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let page = tokio::time::timeout(self.timeout, self.follow(parsed))
            .await
            .map_err(|_| FetchError::Timeout)??;

        tracing::debug!(
            url,
            final_url = %page.final_url,
            status = page.status,
            redirects = page.redirects,
            bytes = page.body.len(),
            "page fetched"
        );

        Ok(page)
    }

    async fn follow(&self, mut current: Url) -> Result<FetchResult, FetchError> {
        let mut redirects = 0;

        loop {
            let response = self.client.get(current.clone()).send().await?;
            let status = response.status();

            if status.is_redirection() {
                if let Some(location) = response.headers().get(LOCATION) {
                    let location = location
                        .to_str()
                        .map_err(|e| FetchError::Transport(format!("bad location header: {e}")))?;
                    let next = current
                        .join(location)
                        .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

                    if redirects == self.follow_cap {
                        return Err(FetchError::TooManyRedirects(redirects));
                    }
                    redirects += 1;
                    tracing::trace!(from = %current, to = %next, redirects, "following redirect");
                    current = next;
                    continue;
                }
            }

            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            let body = response.text().await?;
            return Ok(FetchResult {
                final_url: current,
                status: status.as_u16(),
                redirects,
                body,
            });
        }
    }
}
