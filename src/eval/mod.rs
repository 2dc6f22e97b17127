//! Source evaluation - preferred-domain scoring for research reports
//!
//! Checks whether the URLs cited in a report mostly come from a list of
//! preferred publisher and institution domains. Produces a pass/fail flag
//! against a configurable ratio threshold plus a Markdown summary.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Preferred domains for cited sources.
pub const PREFERRED_DOMAINS: &[&str] = &[
    // General reference / institutions / publishers
    "wikipedia.org",
    "nature.com",
    "science.org",
    "sciencemag.org",
    "cell.com",
    "mit.edu",
    "stanford.edu",
    "harvard.edu",
    "nasa.gov",
    "noaa.gov",
    "europa.eu",
    // CS/AI venues & indexes
    "arxiv.org",
    "acm.org",
    "ieee.org",
    "neurips.cc",
    "icml.cc",
    "openreview.net",
    // Other reputable outlets
    "elifesciences.org",
    "pnas.org",
    "jmlr.org",
    "springer.com",
    "sciencedirect.com",
];

/// Default minimum preferred ratio required to pass.
pub const DEFAULT_MIN_RATIO: f64 = 0.4;

/// Extract `http(s)` URLs from plain text or Markdown.
pub fn extract_urls(text: &str) -> Vec<String> {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    let re = URL_RE.get_or_init(|| {
        // Stop at whitespace and common Markdown/bracket terminators
        Regex::new(r"(?i)https?://[^\s\]\)>}]+").expect("url regex is valid")
    });
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// The host part of a URL, without scheme, path, or port.
pub fn domain_of(url: &str) -> Option<&str> {
    let rest = url.split("//").nth(1)?;
    let host = rest.split('/').next()?;
    let host = host.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Assessment of a single cited URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UrlAssessment {
    /// The URL as found in the text
    pub url: String,
    /// Whether its domain matched the preferred list
    pub preferred: bool,
}

/// Result of scoring a report's cited sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEvaluation {
    /// Total URLs found
    pub total: usize,
    /// URLs on preferred domains
    pub preferred: usize,
    /// preferred / total (0.0 when no URLs were found)
    pub ratio: f64,
    /// Threshold the ratio was compared against
    pub threshold: f64,
    /// Whether the ratio met the threshold
    pub passed: bool,
    /// Per-URL assessments, in order of appearance
    pub details: Vec<UrlAssessment>,
}

impl SourceEvaluation {
    /// Render the evaluation as a Markdown summary.
    pub fn to_markdown(&self) -> String {
        if self.total == 0 {
            return "### Evaluation — Preferred Domains\n\
                No URLs detected in the provided text.\n\
                Please include links in your research results.\n"
                .to_string();
        }

        let mut details = String::new();
        for a in &self.details {
            details.push_str(&format!(
                "- {} -> {}\n",
                a.url,
                if a.preferred {
                    "PREFERRED"
                } else {
                    "NOT PREFERRED"
                }
            ));
        }

        format!(
            "### Evaluation — Preferred Domains\n\
             - Total results: {}\n\
             - Preferred results: {}\n\
             - Ratio: {:.2}%\n\
             - Threshold: {:.0}%\n\
             - Status: {}\n\n\
             **Details:**\n{}",
            self.total,
            self.preferred,
            self.ratio * 100.0,
            self.threshold * 100.0,
            if self.passed { "PASS" } else { "FAIL" },
            details
        )
    }
}

/// Score the URLs cited in `text` against a preferred-domain list.
///
/// A URL counts as preferred when any entry of `domains` is a substring of
/// its host. With no URLs in the text the evaluation fails outright.
///
/// # Example
/// ```
/// use papermule::eval::{evaluate_sources, PREFERRED_DOMAINS};
///
/// let text = "See https://arxiv.org/abs/2401.00001 and https://example.com/post";
/// let eval = evaluate_sources(PREFERRED_DOMAINS, text, 0.4);
/// assert_eq!(eval.total, 2);
/// assert_eq!(eval.preferred, 1);
/// assert!(eval.passed);
/// ```
pub fn evaluate_sources(domains: &[&str], text: &str, min_ratio: f64) -> SourceEvaluation {
    let urls = extract_urls(text);

    let details: Vec<UrlAssessment> = urls
        .into_iter()
        .map(|url| {
            let preferred = domain_of(&url)
                .map(|host| domains.iter().any(|d| host.contains(d)))
                .unwrap_or(false);
            UrlAssessment { url, preferred }
        })
        .collect();

    let total = details.len();
    let preferred = details.iter().filter(|a| a.preferred).count();
    let ratio = if total > 0 {
        preferred as f64 / total as f64
    } else {
        0.0
    };
    let passed = total > 0 && ratio >= min_ratio;

    SourceEvaluation {
        total,
        preferred,
        ratio,
        threshold: min_ratio,
        passed,
        details,
    }
}
