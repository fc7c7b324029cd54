//! Built-in page heuristics. Each rule is independent and only adds points.

use super::{Page, RiskRule};

const CROSS_DOMAIN_FORM_POINTS: u32 = 3;
const HIDDEN_INPUT_POINTS: u32 = 2;
const OBFUSCATION_POINTS: u32 = 3;
const PHISHING_META_POINTS: u32 = 2;

/// Hidden inputs tolerated before the page is flagged.
pub const MAX_HIDDEN_INPUTS: usize = 5;

pub const OBFUSCATION_MARKERS: &[&str] = &["eval(", "atob(", "document.write("];

pub const PHISHING_KEYWORDS: &[&str] = &["password", "bank", "login", "secure", "verification"];

/// +3 for every `<form>` whose `action` holds an absolute URL that does not
/// contain the scanned URL.
///
/// This is a plain substring test, not a host comparison: an action on the
/// same host but another path still counts, and an unrelated action that
/// happens to embed the scanned URL does not.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossDomainFormRule;

impl RiskRule for CrossDomainFormRule {
    fn name(&self) -> &'static str {
        "cross-domain form action"
    }

    fn points(&self, page: &Page<'_>) -> u32 {
        let offending = page
            .select("form")
            .into_iter()
            .filter_map(|form| form.value().attr("action"))
            .filter(|action| action.contains("http") && !action.contains(page.url()))
            .count();
        u32::try_from(offending)
            .unwrap_or(u32::MAX)
            .saturating_mul(CROSS_DOMAIN_FORM_POINTS)
    }
}

/// Flat +2 once the page has more than [`MAX_HIDDEN_INPUTS`] hidden inputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct HiddenInputRule;

impl RiskRule for HiddenInputRule {
    fn name(&self) -> &'static str {
        "excess hidden inputs"
    }

    fn points(&self, page: &Page<'_>) -> u32 {
        if page.select(r#"input[type="hidden"]"#).len() > MAX_HIDDEN_INPUTS {
            HIDDEN_INPUT_POINTS
        } else {
            0
        }
    }
}

/// +3 once if the raw markup contains any [`OBFUSCATION_MARKERS`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ObfuscatedScriptRule;

impl RiskRule for ObfuscatedScriptRule {
    fn name(&self) -> &'static str {
        "obfuscated script"
    }

    fn points(&self, page: &Page<'_>) -> u32 {
        let html = page.html();
        if OBFUSCATION_MARKERS.iter().any(|m| html.contains(m)) {
            OBFUSCATION_POINTS
        } else {
            0
        }
    }
}

/// +2 for every `<meta>` whose `content` mentions a [`PHISHING_KEYWORDS`] entry,
/// ignoring case.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhishingMetaRule;

impl RiskRule for PhishingMetaRule {
    fn name(&self) -> &'static str {
        "phishing keywords in meta"
    }

    fn points(&self, page: &Page<'_>) -> u32 {
        let flagged = page
            .select("meta")
            .into_iter()
            .filter_map(|meta| meta.value().attr("content"))
            .map(str::to_lowercase)
            .filter(|content| PHISHING_KEYWORDS.iter().any(|kw| content.contains(kw)))
            .count();
        u32::try_from(flagged)
            .unwrap_or(u32::MAX)
            .saturating_mul(PHISHING_META_POINTS)
    }
}
