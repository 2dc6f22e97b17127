//! Tool-calling conversation loop
//!
//! The core of papermule: a bounded loop that sends a transcript to a
//! completion provider, dispatches any tool calls the model requests, feeds
//! the results back, and stops when the model returns a final answer or the
//! turn budget runs out.
//!
//! Tool failures stay inside the loop: an unknown tool name, malformed
//! arguments, or a tool returning an error all become failure payloads in
//! the transcript for the model to react to. Only provider failures and a
//! malformed opening transcript abort a run.

use serde_json::{json, Value};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::providers::{ChatOptions, CompletionProvider};
use crate::tools::{ToolContext, ToolRegistry};
use crate::transcript::{Message, ToolCall, Transcript};

/// Default bound on provider round-trips.
pub const DEFAULT_MAX_TURNS: usize = 5;

/// How a loop run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The model returned an assistant message with no tool calls; its
    /// content is the final answer.
    Done {
        /// The final answer text
        answer: String,
    },
    /// The turn budget was spent before the model produced a final answer.
    /// `last_content` is whatever the last assistant message said (possibly
    /// empty) and must not be mistaken for a finished answer.
    Exhausted {
        /// Content of the last assistant message
        last_content: String,
    },
}

impl LoopOutcome {
    /// Whether the run finished with a final answer.
    pub fn is_done(&self) -> bool {
        matches!(self, LoopOutcome::Done { .. })
    }

    /// Whether the run spent its turn budget.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, LoopOutcome::Exhausted { .. })
    }

    /// The assistant content carried by either variant.
    pub fn content(&self) -> &str {
        match self {
            LoopOutcome::Done { answer } => answer,
            LoopOutcome::Exhausted { last_content } => last_content,
        }
    }
}

/// Result of one loop run: the outcome plus the full transcript, handed
/// back to the caller for inspection, evaluation, or rendering.
#[derive(Debug)]
pub struct LoopRun {
    /// How the run ended
    pub outcome: LoopOutcome,
    /// The complete conversation history of this run
    pub transcript: Transcript,
    /// Number of provider round-trips performed
    pub turns: usize,
}

/// A tool-dispatch failure recovered inside the loop.
///
/// These never abort a run: each renders into an `{"error": ...}` payload
/// recorded as the tool result, so the model sees what went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolFailure {
    /// The requested tool name is not in the registry.
    NotFound {
        /// The name the model asked for
        name: String,
    },
    /// The argument payload was not a valid JSON object.
    BadArguments {
        /// What was wrong with the payload
        detail: String,
    },
    /// The tool returned an error during invocation.
    Execution {
        /// The tool's error message
        detail: String,
    },
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolFailure::NotFound { name } => write!(f, "tool not found: {}", name),
            ToolFailure::BadArguments { detail } => write!(f, "invalid arguments: {}", detail),
            ToolFailure::Execution { detail } => write!(f, "{}", detail),
        }
    }
}

impl ToolFailure {
    /// Render this failure as the JSON payload recorded in the transcript.
    pub fn payload(&self) -> String {
        json!({ "error": self.to_string() }).to_string()
    }
}

/// The bounded tool-calling loop.
///
/// A `ToolCallLoop` holds the run settings (turn budget, model override,
/// sampling options, tool context); each [`run`](ToolCallLoop::run) owns its
/// transcript exclusively and returns it in the [`LoopRun`].
///
/// # Example
///
/// ```rust,ignore
/// use papermule::agent::{ContextBuilder, ToolCallLoop};
/// use papermule::tools::research_registry;
///
/// async fn example(provider: &dyn papermule::providers::CompletionProvider) {
///     let registry = research_registry();
///     let transcript = ContextBuilder::new().build_opening("Survey RAG papers.");
///
///     let run = ToolCallLoop::new()
///         .with_max_turns(3)
///         .run(provider, &registry, transcript)
///         .await
///         .unwrap();
///
///     if run.outcome.is_done() {
///         println!("{}", run.outcome.content());
///     }
/// }
/// ```
pub struct ToolCallLoop {
    /// Bound on provider round-trips
    max_turns: usize,
    /// Model override (provider default if None)
    model: Option<String>,
    /// Sampling options passed to every provider call
    options: ChatOptions,
    /// Context handed to every tool invocation
    tool_context: ToolContext,
}

impl ToolCallLoop {
    /// Create a loop with the default turn budget.
    pub fn new() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            model: None,
            options: ChatOptions::default(),
            tool_context: ToolContext::default(),
        }
    }

    /// Set the bound on provider round-trips. Clamped to at least 1.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    /// Override the model for this loop's provider calls.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    /// Set the sampling options for this loop's provider calls.
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the context handed to tool invocations.
    pub fn with_tool_context(mut self, ctx: ToolContext) -> Self {
        self.tool_context = ctx;
        self
    }

    /// The configured turn budget.
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Drive the conversation until the model returns a final answer or the
    /// turn budget runs out.
    ///
    /// # Arguments
    /// * `provider` - The completion provider to call once per turn
    /// * `registry` - Tools the model may request; misses become failure payloads
    /// * `transcript` - The opening conversation; must start with a system
    ///   message followed by at least one user message
    ///
    /// # Errors
    /// Returns an error if the opening transcript is malformed or a provider
    /// call fails. Tool-level failures never surface here; they are recorded
    /// in the transcript instead.
    pub async fn run(
        &self,
        provider: &dyn CompletionProvider,
        registry: &ToolRegistry,
        transcript: Transcript,
    ) -> Result<LoopRun> {
        transcript.validate_opening()?;

        let run_id = Uuid::new_v4();
        let span = info_span!(
            "tool_loop",
            run_id = %run_id,
            provider = provider.name(),
            max_turns = self.max_turns,
        );
        self.drive(provider, registry, transcript).instrument(span).await
    }

    async fn drive(
        &self,
        provider: &dyn CompletionProvider,
        registry: &ToolRegistry,
        mut transcript: Transcript,
    ) -> Result<LoopRun> {
        let mut last_content = String::new();

        for turn in 1..=self.max_turns {
            debug!(turn = turn, "Requesting completion");

            let completion = provider
                .complete(
                    transcript.to_messages(),
                    registry.specs(),
                    self.model.as_deref(),
                    self.options.clone(),
                )
                .await?;

            last_content = completion.content.clone();
            let requests = completion.tool_calls.clone();
            transcript.push(completion.into_message());

            if requests.is_empty() {
                info!(turn = turn, "Final answer received");
                return Ok(LoopRun {
                    outcome: LoopOutcome::Done {
                        answer: last_content,
                    },
                    transcript,
                    turns: turn,
                });
            }

            // Dispatch sequentially, in provider order. Every request gets
            // exactly one tool message appended before the next provider call.
            for call in &requests {
                info!(tool = %call.name, id = %call.id, turn = turn, "Dispatching tool call");
                let start = std::time::Instant::now();

                let payload = dispatch(registry, call, &self.tool_context).await;

                debug!(
                    tool = %call.name,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Tool call recorded"
                );
                transcript.push(Message::tool_result(&call.id, &call.name, &payload));
            }
        }

        info!(
            turns = self.max_turns,
            "Turn budget spent before a final answer"
        );
        Ok(LoopRun {
            outcome: LoopOutcome::Exhausted { last_content },
            transcript,
            turns: self.max_turns,
        })
    }
}

impl Default for ToolCallLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve, parse, and invoke one tool call, capturing every failure mode
/// into a payload string.
async fn dispatch(registry: &ToolRegistry, call: &ToolCall, ctx: &ToolContext) -> String {
    let tool = match registry.get(&call.name) {
        Some(t) => t,
        None => {
            let failure = ToolFailure::NotFound {
                name: call.name.clone(),
            };
            tracing::warn!(tool = %call.name, "Requested tool is not registered");
            return failure.payload();
        }
    };

    let args = match serde_json::from_str::<Value>(&call.arguments) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            let failure = ToolFailure::BadArguments {
                detail: format!("expected a JSON object, got {}", json_kind(&other)),
            };
            tracing::warn!(tool = %call.name, error = %failure, "Rejected tool arguments");
            return failure.payload();
        }
        Err(e) => {
            let failure = ToolFailure::BadArguments {
                detail: e.to_string(),
            };
            tracing::warn!(tool = %call.name, error = %failure, "Rejected tool arguments");
            return failure.payload();
        }
    };

    match tool.invoke(args, ctx).await {
        Ok(result) => result,
        Err(e) => {
            let failure = ToolFailure::Execution {
                detail: e.to_string(),
            };
            tracing::warn!(tool = %call.name, error = %e, "Tool invocation failed");
            failure.payload()
        }
    }
}

/// Name a JSON value's kind for argument-failure messages.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MuleError;
    use crate::providers::Completion;
    use crate::tools::{EchoTool, Tool};
    use crate::transcript::Role;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// A provider that replays a fixed sequence of completions.
    struct ScriptedProvider {
        script: Mutex<Vec<Completion>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(mut script: Vec<Completion>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn default_model(&self) -> &str {
            "test-model"
        }

        async fn complete(
            &self,
            _messages: Vec<Message>,
            _tools: Vec<crate::tools::ToolSpec>,
            _model: Option<&str>,
            _options: ChatOptions,
        ) -> Result<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            script
                .pop()
                .ok_or_else(|| MuleError::Provider("script ran out of completions".to_string()))
        }
    }

    /// A provider that always requests the same tool call.
    struct AlwaysToolProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionProvider for AlwaysToolProvider {
        fn name(&self) -> &str {
            "always-tool"
        }

        fn default_model(&self) -> &str {
            "test-model"
        }

        async fn complete(
            &self,
            _messages: Vec<Message>,
            _tools: Vec<crate::tools::ToolSpec>,
            _model: Option<&str>,
            _options: ChatOptions,
        ) -> Result<Completion> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Completion::with_tools(
                "working on it",
                vec![ToolCall::new(
                    &format!("call_{}", n),
                    "echo",
                    r#"{"message": "again"}"#,
                )],
            ))
        }
    }

    /// A tool that always returns an error.
    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}, "required": []})
        }

        async fn invoke(&self, _args: Value, _ctx: &ToolContext) -> Result<String> {
            Err(MuleError::Tool("deliberate failure".to_string()))
        }
    }

    fn echo_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        registry
    }

    fn opening() -> Transcript {
        Transcript::opening("You are a test assistant.", "Please answer.")
    }

    #[tokio::test]
    async fn test_immediate_answer_one_round_trip() {
        let provider = ScriptedProvider::new(vec![Completion::text("direct answer")]);
        let registry = echo_registry();

        let run = ToolCallLoop::new()
            .run(&provider, &registry, opening())
            .await
            .unwrap();

        assert_eq!(
            run.outcome,
            LoopOutcome::Done {
                answer: "direct answer".to_string()
            }
        );
        assert_eq!(run.turns, 1);
        assert_eq!(provider.call_count(), 1);
        // system, user, assistant
        assert_eq!(run.transcript.len(), 3);
        assert_eq!(run.transcript.last().unwrap().content, "direct answer");
    }

    #[tokio::test]
    async fn test_echo_round_trip_transcript_shape() {
        // Spec example: one echo call, then a final answer.
        let provider = ScriptedProvider::new(vec![
            Completion::with_tools(
                "",
                vec![ToolCall::new("call_1", "echo", r#"{"message": "hi"}"#)],
            ),
            Completion::text("done: hi"),
        ]);
        let registry = echo_registry();

        let run = ToolCallLoop::new()
            .run(&provider, &registry, opening())
            .await
            .unwrap();

        assert!(run.outcome.is_done());
        assert_eq!(run.outcome.content(), "done: hi");
        assert_eq!(run.turns, 2);

        let messages = run.transcript.messages();
        // system, user, assistant(tool_call), tool, assistant(final)
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[2].has_tool_calls());
        assert_eq!(messages[3].role, Role::Tool);
        assert_eq!(messages[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(messages[3].tool_name.as_deref(), Some("echo"));
        assert_eq!(messages[3].content, "hi");
        assert_eq!(messages[4].content, "done: hi");
    }

    #[tokio::test]
    async fn test_exhaustion_after_exactly_max_turns() {
        let provider = AlwaysToolProvider {
            calls: AtomicUsize::new(0),
        };
        let registry = echo_registry();

        let run = ToolCallLoop::new()
            .with_max_turns(3)
            .run(&provider, &registry, opening())
            .await
            .unwrap();

        assert!(run.outcome.is_exhausted());
        assert_eq!(run.outcome.content(), "working on it");
        assert_eq!(run.turns, 3);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        // system, user + 3 * (assistant + tool)
        assert_eq!(run.transcript.len(), 2 + 3 * 2);
    }

    #[tokio::test]
    async fn test_tool_results_preserve_request_order() {
        let provider = ScriptedProvider::new(vec![
            Completion::with_tools(
                "",
                vec![
                    ToolCall::new("call_a", "echo", r#"{"message": "first"}"#),
                    ToolCall::new("call_b", "echo", r#"{"message": "second"}"#),
                    ToolCall::new("call_c", "echo", r#"{"message": "third"}"#),
                ],
            ),
            Completion::text("done"),
        ]);
        let registry = echo_registry();

        let run = ToolCallLoop::new()
            .run(&provider, &registry, opening())
            .await
            .unwrap();

        let tool_messages: Vec<_> = run
            .transcript
            .messages()
            .iter()
            .filter(|m| m.is_tool_result())
            .collect();
        assert_eq!(tool_messages.len(), 3);
        assert_eq!(tool_messages[0].tool_call_id.as_deref(), Some("call_a"));
        assert_eq!(tool_messages[1].tool_call_id.as_deref(), Some("call_b"));
        assert_eq!(tool_messages[2].tool_call_id.as_deref(), Some("call_c"));
        assert_eq!(tool_messages[0].content, "first");
        assert_eq!(tool_messages[1].content, "second");
        assert_eq!(tool_messages[2].content, "third");
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_failure_payload() {
        let provider = ScriptedProvider::new(vec![
            Completion::with_tools("", vec![ToolCall::new("call_1", "ghost", "{}")]),
            Completion::text("recovered"),
        ]);
        let registry = echo_registry();

        let run = ToolCallLoop::new()
            .run(&provider, &registry, opening())
            .await
            .unwrap();

        assert!(run.outcome.is_done());
        let tool_msg = run
            .transcript
            .messages()
            .iter()
            .find(|m| m.is_tool_result())
            .unwrap();
        assert!(tool_msg.content.contains("tool not found: ghost"));
        assert!(tool_msg.content.starts_with("{\"error\""));
    }

    #[tokio::test]
    async fn test_invalid_json_arguments_become_failure_payload() {
        let provider = ScriptedProvider::new(vec![
            Completion::with_tools("", vec![ToolCall::new("call_1", "echo", "not json")]),
            Completion::text("recovered"),
        ]);
        let registry = echo_registry();

        let run = ToolCallLoop::new()
            .run(&provider, &registry, opening())
            .await
            .unwrap();

        assert!(run.outcome.is_done());
        let tool_msg = run
            .transcript
            .messages()
            .iter()
            .find(|m| m.is_tool_result())
            .unwrap();
        assert!(tool_msg.content.contains("invalid arguments"));
    }

    #[tokio::test]
    async fn test_non_object_arguments_become_failure_payload() {
        let provider = ScriptedProvider::new(vec![
            Completion::with_tools("", vec![ToolCall::new("call_1", "echo", "[1, 2]")]),
            Completion::text("recovered"),
        ]);
        let registry = echo_registry();

        let run = ToolCallLoop::new()
            .run(&provider, &registry, opening())
            .await
            .unwrap();

        let tool_msg = run
            .transcript
            .messages()
            .iter()
            .find(|m| m.is_tool_result())
            .unwrap();
        assert!(tool_msg.content.contains("expected a JSON object"));
        assert!(tool_msg.content.contains("an array"));
    }

    #[tokio::test]
    async fn test_raising_tool_does_not_abort_run() {
        let provider = ScriptedProvider::new(vec![
            Completion::with_tools("", vec![ToolCall::new("call_1", "broken", "{}")]),
            Completion::text("carried on"),
        ]);
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(FailingTool));

        let run = ToolCallLoop::new()
            .run(&provider, &registry, opening())
            .await
            .unwrap();

        assert!(run.outcome.is_done());
        assert_eq!(run.outcome.content(), "carried on");
        let tool_msg = run
            .transcript
            .messages()
            .iter()
            .find(|m| m.is_tool_result())
            .unwrap();
        assert!(tool_msg.content.contains("deliberate failure"));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        // Empty script: the first provider call errors.
        let provider = ScriptedProvider::new(vec![]);
        let registry = echo_registry();

        let err = ToolCallLoop::new()
            .run(&provider, &registry, opening())
            .await
            .unwrap_err();
        assert!(matches!(err, MuleError::Provider(_)));
    }

    #[tokio::test]
    async fn test_malformed_opening_rejected_before_provider_call() {
        let provider = ScriptedProvider::new(vec![Completion::text("never sent")]);
        let registry = echo_registry();

        let mut transcript = Transcript::new();
        transcript.push(Message::user("no system prompt"));

        let err = ToolCallLoop::new()
            .run(&provider, &registry, transcript)
            .await
            .unwrap_err();
        assert!(matches!(err, MuleError::Transcript(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_max_turns_clamped_to_one() {
        let looper = ToolCallLoop::new().with_max_turns(0);
        assert_eq!(looper.max_turns(), 1);
    }

    #[test]
    fn test_tool_failure_payloads() {
        let nf = ToolFailure::NotFound {
            name: "ghost".to_string(),
        };
        assert_eq!(nf.payload(), r#"{"error":"tool not found: ghost"}"#);

        let bad = ToolFailure::BadArguments {
            detail: "expected a JSON object, got a string".to_string(),
        };
        assert!(bad.payload().contains("invalid arguments"));

        let exec = ToolFailure::Execution {
            detail: "boom".to_string(),
        };
        assert_eq!(exec.payload(), r#"{"error":"boom"}"#);
    }

    #[test]
    fn test_json_kind_names() {
        assert_eq!(json_kind(&json!(null)), "null");
        assert_eq!(json_kind(&json!(true)), "a boolean");
        assert_eq!(json_kind(&json!(1)), "a number");
        assert_eq!(json_kind(&json!("s")), "a string");
        assert_eq!(json_kind(&json!([])), "an array");
        assert_eq!(json_kind(&json!({})), "an object");
    }

    #[test]
    fn test_loop_outcome_accessors() {
        let done = LoopOutcome::Done {
            answer: "a".to_string(),
        };
        assert!(done.is_done());
        assert!(!done.is_exhausted());
        assert_eq!(done.content(), "a");

        let exhausted = LoopOutcome::Exhausted {
            last_content: "b".to_string(),
        };
        assert!(exhausted.is_exhausted());
        assert_eq!(exhausted.content(), "b");
    }
}
