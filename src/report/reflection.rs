//! Reflection-and-rewrite pass.
//!
//! Asks the provider to review a draft report and produce a structured
//! reflection plus a revised version, as strict JSON. Output that is not
//! valid JSON is a typed error, never a panic; a Markdown code fence around
//! the JSON is tolerated.

use serde::Deserialize;

use crate::error::{MuleError, Result};
use crate::providers::{ChatOptions, CompletionProvider};
use crate::transcript::Message;

/// System prompt for the reviewer persona.
const REVIEWER_SYSTEM_PROMPT: &str = "You are an academic reviewer and editor.";

/// Default sampling temperature for review passes.
pub const REFLECTION_TEMPERATURE: f32 = 0.3;

/// Structured output of one reflection pass.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Reflection {
    /// The reviewer's structured feedback
    pub reflection: String,
    /// The improved version of the input report
    pub revised_report: String,
}

/// Build the user prompt asking for a strict-JSON review of `report`.
fn reflection_prompt(report: &str) -> String {
    format!(
        r#"You are reviewing a draft research report. Provide feedback and an enhanced version.

The feedback and revision must cover exactly the following items:
- strengths,
- limitations,
- suggestions, and
- opportunities.

You must STRICTLY output the response with the following JSON schema:

{{ "reflection": "<text>", "revised_report": "<text>" }}

Input report:
<input_report>{}</input_report>

Output only the JSON object and nothing else."#,
        report
    )
}

/// Strip a surrounding Markdown code fence, if present.
///
/// Models often wrap JSON in ```json ... ``` despite instructions.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "html", ...) on the opening fence line
    match body.split_once('\n') {
        Some((_, content)) => content.trim(),
        None => body.trim(),
    }
}

/// Run a reflection-and-rewrite pass over a draft report.
///
/// # Errors
/// Returns [`MuleError::Report`] if the provider's output is not the
/// expected JSON object, and propagates provider failures.
pub async fn reflect_and_rewrite(
    provider: &dyn CompletionProvider,
    report: &str,
    model: Option<&str>,
    options: ChatOptions,
) -> Result<Reflection> {
    let messages = vec![
        Message::system(REVIEWER_SYSTEM_PROMPT),
        Message::user(&reflection_prompt(report)),
    ];

    let completion = provider.complete(messages, vec![], model, options).await?;

    parse_reflection(&completion.content)
}

/// Parse a provider reply into a [`Reflection`].
pub fn parse_reflection(raw: &str) -> Result<Reflection> {
    let body = strip_code_fence(raw);
    serde_json::from_str::<Reflection>(body).map_err(|e| {
        MuleError::Report(format!(
            "reflection output was not the expected JSON object: {}",
            e
        ))
    })
}
