//! Report pipeline - the researcher workflow around the tool loop
//!
//! Stages:
//! 1. `draft`: run the tool-calling loop with the research system prompt and
//!    the built-in research tools, producing a draft report.
//! 2. `reflect`: ask the provider for structured feedback plus a revised
//!    report (strict JSON contract).
//! 3. `render_html` / `save_html`: convert the report to a standalone HTML
//!    page and write it under the workspace output directory.
//!
//! A draft that exhausts its turn budget is reported as such — callers must
//! not treat the partial content as a finished report.

mod html;
mod reflection;

pub use html::{render_html, RENDER_TEMPERATURE};
pub use reflection::{
    parse_reflection, reflect_and_rewrite, Reflection, REFLECTION_TEMPERATURE,
};

use std::path::{Path, PathBuf};

use tracing::info;

use crate::agent::{ContextBuilder, LoopRun, ToolCallLoop};
use crate::error::{MuleError, Result};
use crate::providers::{ChatOptions, CompletionProvider};
use crate::tools::{ToolContext, ToolRegistry};

/// Turn budget for draft passes; research runs rarely need more.
pub const DRAFT_MAX_TURNS: usize = 3;

/// The research-assistant system prompt used for draft passes.
pub fn research_system_prompt() -> &'static str {
    r#"You are a research assistant that can search arXiv and the web to write detailed, accurate, and properly sourced research reports.

Use tools when appropriate (e.g., to find scientific papers or encyclopedic background).
Cite sources whenever relevant. Do NOT omit citations for brevity.
When possible, include full URLs (arXiv links, web sources, etc.).
Use an academic tone, organize output into clearly labeled sections, and include inline citations or footnotes as needed.
Do not include placeholder text such as "(citation needed)" or "(citations omitted)"."#
}

/// The researcher workflow: draft, reflect, render.
///
/// Holds the provider and registry by reference; each stage is an explicit
/// call so callers can stop after any of them.
pub struct ReportPipeline<'a> {
    provider: &'a dyn CompletionProvider,
    registry: &'a ToolRegistry,
    model: Option<String>,
    options: ChatOptions,
    max_turns: usize,
    workspace: PathBuf,
}

impl<'a> ReportPipeline<'a> {
    /// Create a pipeline over a provider and tool registry.
    pub fn new(provider: &'a dyn CompletionProvider, registry: &'a ToolRegistry) -> Self {
        Self {
            provider,
            registry,
            model: None,
            options: ChatOptions::default(),
            max_turns: DRAFT_MAX_TURNS,
            workspace: PathBuf::from("."),
        }
    }

    /// Override the model for every stage.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    /// Set the sampling options for every stage.
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the turn budget for the draft stage. Clamped to at least 1.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    /// Set the workspace directory for tools and saved output.
    pub fn with_workspace(mut self, workspace: &Path) -> Self {
        self.workspace = workspace.to_path_buf();
        self
    }

    /// Run the tool loop to produce a draft report.
    ///
    /// The returned [`LoopRun`] says whether the draft finished or the turn
    /// budget ran out; inspect `outcome` before using the content.
    pub async fn draft(&self, prompt: &str) -> Result<LoopRun> {
        let transcript = ContextBuilder::new()
            .with_system_prompt(research_system_prompt())
            .build_opening(prompt);

        let workspace = self.workspace.to_string_lossy();
        let mut looper = ToolCallLoop::new()
            .with_max_turns(self.max_turns)
            .with_options(self.options.clone())
            .with_tool_context(ToolContext::new().with_workspace(&workspace));
        if let Some(ref model) = self.model {
            looper = looper.with_model(model);
        }

        looper.run(self.provider, self.registry, transcript).await
    }

    /// Run the reflection-and-rewrite pass over a draft.
    pub async fn reflect(&self, report: &str) -> Result<Reflection> {
        let options = self
            .options
            .clone()
            .with_temperature(REFLECTION_TEMPERATURE);
        reflect_and_rewrite(self.provider, report, self.model.as_deref(), options).await
    }

    /// Render a report as a standalone HTML page.
    pub async fn render_html(&self, report: &str) -> Result<String> {
        let options = self.options.clone().with_temperature(RENDER_TEMPERATURE);
        render_html(self.provider, report, self.model.as_deref(), options).await
    }

    /// Save rendered HTML under `<workspace>/output/<stem>.html`.
    pub async fn save_html(&self, html: &str, stem: &str) -> Result<PathBuf> {
        if stem.is_empty() || stem.contains('/') || stem.contains('\\') || stem.contains("..") {
            return Err(MuleError::Report(format!(
                "invalid output file stem: {}",
                stem
            )));
        }

        let dir = self.workspace.join("output");
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.html", stem));
        tokio::fs::write(&path, html).await?;

        info!(path = %path.display(), bytes = html.len(), "HTML report written");
        Ok(path)
    }
}
