//! Page-content risk scoring.
//!
//! A fetched page is parsed once and handed to every [`RiskRule`] in a
//! [`RuleSet`]. Rule contributions are summed; the page is flagged once the
//! sum exceeds [`PHISHING_THRESHOLD`]. Pages that could not be fetched, or
//! came back empty, get [`UNREACHABLE_SCORE`] without running any rule.

pub mod rules;

use crate::error::FetchError;
use crate::fetch::{FetchResult, PageFetcher};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

pub use rules::{CrossDomainFormRule, HiddenInputRule, ObfuscatedScriptRule, PhishingMetaRule};

/// Scores strictly above this are phishing.
pub const PHISHING_THRESHOLD: u32 = 5;

/// Score assigned when there is no page to inspect.
pub const UNREACHABLE_SCORE: u32 = 10;

/// A parsed page as seen by the rules.
pub struct Page<'a> {
    url: &'a str,
    html: &'a str,
    document: Html,
}

impl<'a> Page<'a> {
    pub fn parse(url: &'a str, html: &'a str) -> Self {
        Self {
            url,
            html,
            document: Html::parse_document(html),
        }
    }

    /// The URL as the caller supplied it, not the post-redirect one.
    pub fn url(&self) -> &str {
        self.url
    }

    pub fn html(&self) -> &str {
        self.html
    }

    /// Elements matching `css`. An unparseable selector matches nothing.
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.document.select(&selector).collect(),
            Err(e) => {
                tracing::error!(selector = css, error = ?e, "invalid css selector in risk rule");
                Vec::new()
            }
        }
    }
}

pub trait RiskRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Non-negative contribution of this rule for `page`.
    fn points(&self, page: &Page<'_>) -> u32;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub rule: &'static str,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRiskResult {
    pub risk_score: u32,
    pub is_phishing: bool,
    /// Rules that fired. Empty for unreachable pages.
    pub findings: Vec<Finding>,
}

impl ContentRiskResult {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let risk_score = findings
            .iter()
            .fold(0u32, |acc, f| acc.saturating_add(f.points));
        Self {
            risk_score,
            is_phishing: risk_score > PHISHING_THRESHOLD,
            findings,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            risk_score: UNREACHABLE_SCORE,
            is_phishing: true,
            findings: Vec::new(),
        }
    }
}

pub struct RuleSet {
    rules: Vec<Box<dyn RiskRule>>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::empty()
            .with_rule(CrossDomainFormRule)
            .with_rule(HiddenInputRule)
            .with_rule(ObfuscatedScriptRule)
            .with_rule(PhishingMetaRule)
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.name()))
            .finish()
    }
}

impl RuleSet {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: impl RiskRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Score `html`, fetched from `url`. An empty body is fail-closed.
    pub fn scan_html(&self, url: &str, html: &str) -> ContentRiskResult {
        if html.is_empty() {
            return ContentRiskResult::unreachable();
        }

        let page = Page::parse(url, html);
        let findings = self
            .rules
            .iter()
            .map(|rule| Finding {
                rule: rule.name(),
                points: rule.points(&page),
            })
            .filter(|f| f.points > 0)
            .collect();

        ContentRiskResult::from_findings(findings)
    }
}

/// Score an already-performed fetch of `url`. A failed fetch is fail-closed.
pub fn content_outcome(
    url: &str,
    fetched: &Result<FetchResult, FetchError>,
    rules: &RuleSet,
) -> ContentRiskResult {
    match fetched {
        Ok(page) => rules.scan_html(url, &page.body),
        Err(e) => {
            tracing::warn!(url, error = %e, "content scan could not fetch page");
            ContentRiskResult::unreachable()
        }
    }
}

/// Fetch `url` on its own and score its body.
pub async fn scan_content(fetcher: &PageFetcher, rules: &RuleSet, url: &str) -> ContentRiskResult {
    let fetched = fetcher.fetch(url).await;
    content_outcome(url, &fetched, rules)
}
