//! HTML rendering pass.
//!
//! Converts a plaintext research report into a standalone HTML page by
//! prompting the provider, preserving citations and links.

use crate::error::{MuleError, Result};
use crate::providers::{ChatOptions, CompletionProvider};
use crate::transcript::Message;

use super::reflection::strip_code_fence;

/// System prompt for the converter persona.
const CONVERTER_SYSTEM_PROMPT: &str =
    "You convert plaintext reports into full clean HTML documents.";

/// Default sampling temperature for render passes.
pub const RENDER_TEMPERATURE: f32 = 0.5;

/// Build the user prompt asking for an HTML-only conversion of `report`.
fn render_prompt(report: &str) -> String {
    format!(
        r#"Convert the following plain text into a complete HTML document.

INPUT:
<plain_text>{}</plain_text>

Ensure the output is valid, clean HTML with appropriate section headers,
formatted paragraphs, and clickable links. Preserve the citation style.

The output must be only the final HTML result and nothing else."#,
        report
    )
}

/// Render a plaintext report as a standalone HTML page.
///
/// # Errors
/// Returns [`MuleError::Report`] if the provider returns empty output, and
/// propagates provider failures.
pub async fn render_html(
    provider: &dyn CompletionProvider,
    report: &str,
    model: Option<&str>,
    options: ChatOptions,
) -> Result<String> {
    let messages = vec![
        Message::system(CONVERTER_SYSTEM_PROMPT),
        Message::user(&render_prompt(report)),
    ];

    let completion = provider.complete(messages, vec![], model, options).await?;

    let html = strip_code_fence(&completion.content).to_string();
    if html.is_empty() {
        return Err(MuleError::Report(
            "provider returned empty HTML output".to_string(),
        ));
    }
    Ok(html)
}
