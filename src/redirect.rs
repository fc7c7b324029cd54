use crate::error::FetchError;
use crate::fetch::{FetchResult, PageFetcher};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectOutcome {
    /// Origin and final host agree once a leading `www.` is dropped, and the
    /// chain stayed within the redirect cap.
    pub safe: bool,
    /// Where the redirect chain ended; `None` when the fetch failed.
    pub final_url: Option<Url>,
    pub redirects: usize,
}

impl RedirectOutcome {
    fn failed() -> Self {
        Self {
            safe: false,
            final_url: None,
            redirects: 0,
        }
    }
}

fn normalized_host(url: &Url) -> Option<&str> {
    let host = url.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host))
}

/// Compare hostnames after stripping a single leading `www.` label.
pub fn same_site(original: &Url, resolved: &Url) -> bool {
    match (normalized_host(original), normalized_host(resolved)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Judge an already-performed fetch of `url`. Any failure, or a chain longer
/// than `max_redirects` hops, is unsafe.
pub fn redirect_outcome(
    url: &str,
    fetched: &Result<FetchResult, FetchError>,
    max_redirects: usize,
) -> RedirectOutcome {
    let page = match fetched {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(url, error = %e, "redirect check failed");
            return RedirectOutcome::failed();
        }
    };

    let original = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => {
            tracing::warn!(url, error = %e, "redirect check could not parse url");
            return RedirectOutcome::failed();
        }
    };

    tracing::debug!(
        url,
        final_url = %page.final_url,
        status = page.status,
        redirects = page.redirects,
        "judging redirect chain"
    );

    let within_cap = page.redirects <= max_redirects;
    if !within_cap {
        tracing::warn!(url, redirects = page.redirects, max_redirects, "redirect chain too long");
    }

    let same_host = same_site(&original, &page.final_url);
    if !same_host {
        tracing::info!(url, final_url = %page.final_url, "redirect left the original host");
    }

    RedirectOutcome {
        safe: within_cap && same_host,
        final_url: Some(page.final_url.clone()),
        redirects: page.redirects,
    }
}

/// Fetch `url` on its own and compare where it lands with where it started.
pub async fn resolve_redirect_safety(fetcher: &PageFetcher, url: &str) -> RedirectOutcome {
    let fetched = fetcher.fetch(url).await;
    redirect_outcome(url, &fetched, fetcher.max_redirects())
}
