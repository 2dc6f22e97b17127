//! arXiv search tool.
//!
//! Queries the arXiv Atom API and returns a compact text listing of matching
//! papers (title, link, published date, abstract excerpt) for the model to
//! cite in research reports.

use std::time::Duration;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{MuleError, Result};

use super::{Tool, ToolContext};

const ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";
const REQUEST_TIMEOUT_SECS: u64 = 20;
const DEFAULT_MAX_RESULTS: usize = 5;
const MAX_RESULTS_CAP: usize = 20;
/// Abstract excerpt length in characters.
const SUMMARY_EXCERPT_CHARS: usize = 400;

/// One paper parsed from the Atom feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArxivEntry {
    /// Paper title
    pub title: String,
    /// Canonical arXiv URL (the Atom `<id>`)
    pub url: String,
    /// Publication date
    pub published: String,
    /// Abstract text
    pub summary: String,
}

/// Tool searching arXiv for academic papers.
pub struct ArxivSearchTool {
    client: Client,
    max_results: usize,
}

impl ArxivSearchTool {
    /// Create a new arXiv search tool with default result count.
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Create an arXiv search tool with a custom default result count.
    pub fn with_max_results(max_results: usize) -> Self {
        let mut tool = Self::new();
        tool.max_results = max_results.clamp(1, MAX_RESULTS_CAP);
        tool
    }
}

impl Default for ArxivSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse runs of whitespace (Atom feeds wrap titles and abstracts).
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse the entries out of an arXiv Atom feed.
pub fn parse_atom_feed(xml: &str) -> Result<Vec<ArxivEntry>> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();

    let mut in_entry = false;
    let mut current_tag: Option<String> = None;
    let mut title = String::new();
    let mut url = String::new();
    let mut published = String::new();
    let mut summary = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "entry" {
                    in_entry = true;
                    title.clear();
                    url.clear();
                    published.clear();
                    summary.clear();
                } else if in_entry {
                    current_tag = Some(name);
                }
            }
            Ok(Event::Text(t)) => {
                if in_entry {
                    let text = t
                        .unescape()
                        .map_err(|e| MuleError::Tool(format!("invalid Atom text: {}", e)))?;
                    match current_tag.as_deref() {
                        Some("title") => title.push_str(&text),
                        Some("id") => url.push_str(&text),
                        Some("published") => published.push_str(&text),
                        Some("summary") => summary.push_str(&text),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "entry" {
                    in_entry = false;
                    entries.push(ArxivEntry {
                        title: normalize_whitespace(&title),
                        url: url.trim().to_string(),
                        published: published.trim().to_string(),
                        summary: normalize_whitespace(&summary),
                    });
                } else {
                    current_tag = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MuleError::Tool(format!("malformed Atom feed: {}", e))),
            _ => {}
        }
    }

    Ok(entries)
}

/// Render parsed entries as a compact numbered listing.
pub fn format_entries(entries: &[ArxivEntry]) -> String {
    if entries.is_empty() {
        return "No papers found.".to_string();
    }

    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let excerpt: String = entry.summary.chars().take(SUMMARY_EXCERPT_CHARS).collect();
        let ellipsis = if entry.summary.chars().count() > SUMMARY_EXCERPT_CHARS {
            "..."
        } else {
            ""
        };
        out.push_str(&format!(
            "{}. {} ({})\n   {}\n   {}{}\n",
            i + 1,
            entry.title,
            entry.published,
            entry.url,
            excerpt,
            ellipsis
        ));
    }
    out
}

#[async_trait]
impl Tool for ArxivSearchTool {
    fn name(&self) -> &str {
        "arxiv_search"
    }

    fn description(&self) -> &str {
        "Search arXiv for academic papers and return titles, links, dates, and abstract excerpts"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Number of papers to return (1-20)",
                    "minimum": 1,
                    "maximum": 20
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> Result<String> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MuleError::Tool("missing required argument: query".to_string()))?;
        let max_results = args
            .get("max_results")
            .and_then(|v| v.as_u64())
            .map(|n| (n as usize).clamp(1, MAX_RESULTS_CAP))
            .unwrap_or(self.max_results);

        debug!(query = %query, max_results = max_results, "arXiv search");

        let xml = self
            .client
            .get(ARXIV_API_URL)
            .query(&[
                ("search_query", format!("all:{}", query).as_str()),
                ("start", "0"),
                ("max_results", max_results.to_string().as_str()),
            ])
            .send()
            .await?
            .text()
            .await?;

        let entries = parse_atom_feed(&xml)?;
        Ok(format_entries(&entries))
    }
}
