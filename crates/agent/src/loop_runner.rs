//! The bounded agent loop.
//!
//! One run alternates between invoking the model and dispatching the tool
//! calls it requested, until the model answers with plain text or the step
//! budget runs out. Every model invocation consumes one step; tool dispatch
//! is free. Tool failures of any kind are folded into tool-result messages
//! so the model can read them and adapt — only provider failures and budget
//! exhaustion abort the run.

use repokeep_core::error::{AgentError, Result};
use repokeep_core::message::{Conversation, Message};
use repokeep_core::provider::{Provider, ProviderRequest};
use repokeep_core::tool::{ToolCall, ToolRegistry};
use repokeep_core::trace::Trace;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Maximum model invocations per run
    max_steps: u32,

    /// Progress line side-channel
    trace: Trace,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            tools,
            max_steps: 25,
            trace: Trace::quiet(),
        }
    }

    /// Set the step budget (model invocations per run).
    pub fn with_max_steps(mut self, max: u32) -> Self {
        self.max_steps = max;
        self
    }

    /// Set the default max tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Attach a trace for progress lines.
    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.trace = trace;
        self
    }

    /// Drive the conversation to a terminal state.
    ///
    /// Returns the model's final text on success. On budget exhaustion the
    /// run aborts with `AgentError::BudgetExceeded` — the batch of tool
    /// calls from the final permitted invocation is recorded in the
    /// conversation but never dispatched. The conversation remains
    /// inspectable either way.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<String> {
        let tool_definitions = self.tools.definitions();
        let mut remaining = self.max_steps;

        loop {
            if remaining == 0 {
                warn!(limit = self.max_steps, "Step budget exhausted");
                return Err(AgentError::BudgetExceeded {
                    limit: self.max_steps,
                }
                .into());
            }
            remaining -= 1;

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: conversation.messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            debug!(remaining, messages = conversation.messages.len(), "Invoking model");
            let response = self.provider.complete(request).await?;

            if response.message.tool_calls.is_empty() {
                // Plain text — terminal state. Even empty text terminates;
                // the normalizer's fallback handles it downstream.
                let text = response.message.content.clone();
                if !text.trim().is_empty() {
                    self.trace.emit("agent", &text);
                }
                conversation.push(response.message);
                return Ok(text);
            }

            let tool_calls = response.message.tool_calls.clone();
            for tc in &tool_calls {
                self.trace.emit(
                    "agent",
                    &format!("Calling tool '{}' with args {}", tc.name, tc.arguments),
                );
            }
            conversation.push(response.message);

            if remaining == 0 {
                // The budget covered the invocation but not another round
                // trip; the batch is recorded, never dispatched.
                warn!(limit = self.max_steps, "Step budget exhausted");
                return Err(AgentError::BudgetExceeded {
                    limit: self.max_steps,
                }
                .into());
            }

            // Dispatch strictly in the order the model requested.
            for tc in &tool_calls {
                let arguments = if tc.arguments.trim().is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(&tc.arguments).unwrap_or_default()
                };
                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments,
                };

                let output = match self.tools.execute(&call).await {
                    Ok(result) => result.output,
                    Err(e) => {
                        warn!(tool = %tc.name, error = %e, "Tool execution failed");
                        format!("Error: {e}")
                    }
                };
                self.trace.emit(&format!("tool:{}", tc.name), &output);
                conversation.push(Message::tool_result(&tc.id, &output));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{make_tool_call, make_tool_call_response, SequentialMockProvider};
    use async_trait::async_trait;
    use repokeep_core::error::{Error, ToolError};
    use repokeep_core::message::Role;
    use repokeep_core::tool::{Tool, ToolOutput};
    use repokeep_core::trace::MemorySink;
    use std::sync::Mutex;

    /// Records every invocation in a shared journal.
    struct JournalTool {
        name: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Tool for JournalTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "Appends its label argument to a shared journal"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "label": { "type": "string" }
                },
                "required": ["label"]
            })
        }
        async fn execute(
            &self,
            arguments: serde_json::Value,
        ) -> std::result::Result<ToolOutput, ToolError> {
            let label = arguments["label"].as_str().unwrap_or("").to_string();
            let mut journal = self.journal.lock().unwrap();
            journal.push(label);
            // Output reflects everything written so far, so a later call
            // can observe an earlier call's effect.
            Ok(ToolOutput::ok(journal.join(",")))
        }
    }

    fn journal_registry(journal: Arc<Mutex<Vec<String>>>) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(JournalTool {
            name: "journal",
            journal,
        }));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn text_response_terminates_immediately() {
        let provider = Arc::new(SequentialMockProvider::single_text("All dependencies current."));
        let agent = AgentLoop::new(
            provider.clone(),
            "mock-model",
            0.0,
            Arc::new(ToolRegistry::new()),
        );

        let mut conv = Conversation::seeded("system", "go");
        let response = agent.run(&mut conv).await.unwrap();
        assert_eq!(response, "All dependencies current.");
        assert_eq!(provider.call_count(), 1);
        // system + user + assistant
        assert_eq!(conv.messages.len(), 3);
    }

    #[tokio::test]
    async fn tool_batch_dispatched_in_order_with_matching_ids() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut first = make_tool_call("journal", serde_json::json!({"label": "a"}));
        first.id = "call_a".into();
        let mut second = make_tool_call("journal", serde_json::json!({"label": "b"}));
        second.id = "call_b".into();

        let provider = Arc::new(SequentialMockProvider::tool_then_answer(
            vec![first, second],
            "",
            "done",
        ));
        let agent = AgentLoop::new(
            provider,
            "mock-model",
            0.0,
            journal_registry(journal.clone()),
        );

        let mut conv = Conversation::seeded("system", "go");
        let response = agent.run(&mut conv).await.unwrap();
        assert_eq!(response, "done");

        // Sequential, in request order.
        assert_eq!(*journal.lock().unwrap(), vec!["a", "b"]);

        // The second dispatch observed the first one's write.
        let results: Vec<_> = conv
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].tool_call_id.as_deref(), Some("call_a"));
        assert_eq!(results[0].content, "a");
        assert_eq!(results[1].tool_call_id.as_deref(), Some("call_b"));
        assert_eq!(results[1].content, "a,b");
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_in_band() {
        let provider = Arc::new(SequentialMockProvider::tool_then_answer(
            vec![make_tool_call("no_such_tool", serde_json::json!({}))],
            "",
            "recovered",
        ));
        let agent = AgentLoop::new(
            provider,
            "mock-model",
            0.0,
            Arc::new(ToolRegistry::new()),
        );

        let mut conv = Conversation::seeded("system", "go");
        let response = agent.run(&mut conv).await.unwrap();
        assert_eq!(response, "recovered");

        let result = conv
            .messages
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(result.content.starts_with("Error:"));
        assert!(result.content.contains("no_such_tool"));
    }

    #[tokio::test]
    async fn invalid_arguments_are_reported_in_band() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let provider = Arc::new(SequentialMockProvider::tool_then_answer(
            vec![make_tool_call("journal", serde_json::json!({"label": 7}))],
            "",
            "recovered",
        ));
        let agent = AgentLoop::new(
            provider,
            "mock-model",
            0.0,
            journal_registry(journal.clone()),
        );

        let mut conv = Conversation::seeded("system", "go");
        agent.run(&mut conv).await.unwrap();

        // Validation rejected the call before the handler ran.
        assert!(journal.lock().unwrap().is_empty());
        let result = conv
            .messages
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(result.content.contains("label"));
    }

    #[tokio::test]
    async fn budget_exhaustion_aborts_without_dispatching_final_batch() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let responses = (0..3)
            .map(|i| {
                make_tool_call_response(
                    vec![make_tool_call(
                        "journal",
                        serde_json::json!({"label": format!("step{i}")}),
                    )],
                    "",
                )
            })
            .collect();
        let provider = Arc::new(SequentialMockProvider::new(responses));

        let agent = AgentLoop::new(
            provider.clone(),
            "mock-model",
            0.0,
            journal_registry(journal.clone()),
        )
        .with_max_steps(3);

        let mut conv = Conversation::seeded("system", "go");
        let err = agent.run(&mut conv).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Agent(AgentError::BudgetExceeded { limit: 3 })
        ));

        // Three invocations, but only the first two batches dispatched.
        assert_eq!(provider.call_count(), 3);
        assert_eq!(*journal.lock().unwrap(), vec!["step0", "step1"]);

        // The final assistant message carries undispatched tool calls.
        let last = conv.messages.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(!last.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn empty_final_response_still_terminates() {
        let provider = Arc::new(SequentialMockProvider::single_text("   "));
        let agent = AgentLoop::new(
            provider.clone(),
            "mock-model",
            0.0,
            Arc::new(ToolRegistry::new()),
        );

        let mut conv = Conversation::seeded("system", "go");
        let response = agent.run(&mut conv).await.unwrap();
        assert_eq!(response, "   ");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(conv.messages.last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn trace_captures_loop_transitions() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut call = make_tool_call("journal", serde_json::json!({"label": "a"}));
        call.id = "call_a".into();
        let provider = Arc::new(SequentialMockProvider::tool_then_answer(
            vec![call],
            "",
            "all done",
        ));

        let sink = Arc::new(MemorySink::new());
        let agent = AgentLoop::new(
            provider,
            "mock-model",
            0.0,
            journal_registry(journal),
        )
        .with_trace(Trace::with_sink(sink.clone()));

        let mut conv = Conversation::seeded("system", "go");
        agent.run(&mut conv).await.unwrap();

        let lines = sink.lines();
        assert_eq!(
            lines,
            vec![
                "[agent] Calling tool 'journal' with args {\"label\":\"a\"}",
                "[tool:journal] a",
                "[agent] all done",
            ]
        );
    }
}
