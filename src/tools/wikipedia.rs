//! Wikipedia lookup tool.
//!
//! Fetches an article summary from the Wikipedia REST API, giving the model
//! encyclopedic background alongside arXiv results.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{MuleError, Result};

use super::{Tool, ToolContext};

const WIKIPEDIA_SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";
const WIKI_USER_AGENT: &str = "papermule/0.3 (+https://github.com/papermule/papermule)";
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Summary response from the Wikipedia REST API.
#[derive(Debug, Deserialize)]
struct SummaryResponse {
    title: String,
    extract: String,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: PageUrls,
}

#[derive(Debug, Deserialize)]
struct PageUrls {
    page: String,
}

/// Tool returning Wikipedia article summaries.
pub struct WikipediaTool {
    client: Client,
}

impl WikipediaTool {
    /// Create a new Wikipedia tool with a default HTTP client.
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .user_agent(WIKI_USER_AGENT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a Wikipedia tool with a custom HTTP client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Render a summary response as tool-result text.
    fn render(summary: &SummaryResponse) -> String {
        let url = summary
            .content_urls
            .as_ref()
            .map(|u| u.desktop.page.as_str())
            .unwrap_or("");
        if url.is_empty() {
            format!("{}\n{}", summary.title, summary.extract)
        } else {
            format!("{} ({})\n{}", summary.title, url, summary.extract)
        }
    }
}

impl Default for WikipediaTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "wikipedia_search"
    }

    fn description(&self) -> &str {
        "Look up an encyclopedic summary of a topic on Wikipedia"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Article title to look up"
                }
            },
            "required": ["title"]
        })
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> Result<String> {
        let title = args
            .get("title")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MuleError::Tool("missing required argument: title".to_string()))?;

        // Spaces become underscores in Wikipedia page titles
        let page = title.trim().replace(' ', "_");
        if page.is_empty() {
            return Err(MuleError::Tool("article title is empty".to_string()));
        }

        debug!(title = %page, "Wikipedia lookup");

        let response = self
            .client
            .get(format!("{}/{}", WIKIPEDIA_SUMMARY_URL, page))
            .send()
            .await?;

        if response.status().as_u16() == 404 {
            return Ok(format!("No Wikipedia article found for \"{}\".", title));
        }
        let summary: SummaryResponse = response.error_for_status()?.json().await?;

        Ok(Self::render(&summary))
    }
}
