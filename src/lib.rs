//! Heuristic URL phishing detector.
//!
//! A URL is judged on four signals: its length, the shape of its domain,
//! whether fetching it redirects to another host, and a score computed from
//! the fetched page's markup. Anything that cannot be verified counts as risk.

pub mod config;
pub mod content;
pub mod error;
pub mod evaluator;
pub mod fetch;
pub mod lexical;
pub mod redirect;
pub mod server;

pub use config::Config;
pub use content::{ContentRiskResult, RiskRule, RuleSet};
pub use error::{ConfigError, EvalError, FetchError};
pub use evaluator::{EvaluationReport, Evaluator, ReportDetails};
pub use fetch::{FetchResult, PageFetcher};
pub use redirect::RedirectOutcome;
