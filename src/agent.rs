use std::sync::Arc;

use clx::progress::ProgressJob;
use log::{info, warn};

use crate::error::{Error, Result};
use crate::llm::{Conversation, LlmClient, ToolCall, TurnResponse};
use crate::session::SessionState;
use crate::tools::{ToolContext, ToolRegistry};

pub const DEFAULT_MAX_ROUNDS: usize = 10;

pub struct AgentContext<'a> {
    pub client: &'a dyn LlmClient,
    pub system: &'a str,
    pub registry: &'a ToolRegistry,
    pub tools: ToolContext<'a>,
    pub max_rounds: usize,
    pub job: &'a Arc<ProgressJob>,
}

enum Phase {
    AwaitingModelTurn,
    EvaluatingToolRequests(TurnResponse),
    ExecutingTools(Vec<ToolCall>),
    Done(String),
}

/// Drive one user turn to a final answer. The caller has already appended the
/// user message to `conversation`.
pub async fn run_turn(
    ctx: &AgentContext<'_>,
    conversation: &mut Conversation,
    session: &mut SessionState,
) -> Result<String> {
    let definitions = ctx.registry.definitions();
    let mut rounds = 0;
    let mut phase = Phase::AwaitingModelTurn;

    loop {
        phase = match phase {
            Phase::AwaitingModelTurn => {
                if rounds == ctx.max_rounds {
                    return Err(Error::RoundLimit(ctx.max_rounds));
                }
                rounds += 1;
                info!("agent round {rounds}");
                ctx.job
                    .prop("message", &format!("Thinking... (round {rounds})"));

                let response = ctx
                    .client
                    .send_turn(ctx.system, conversation, &definitions)
                    .await?;
                session.record_model_call(&response.usage);
                info!(
                    "usage: {} input, {} output tokens",
                    response.usage.input_tokens, response.usage.output_tokens
                );
                Phase::EvaluatingToolRequests(response)
            }
            Phase::EvaluatingToolRequests(response) => {
                if response.tool_calls.is_empty() {
                    let text = response.text.unwrap_or_default();
                    if text.is_empty() {
                        warn!(
                            "model finished without text (stop reason {:?})",
                            response.stop_reason
                        );
                    }
                    Phase::Done(text)
                } else {
                    Phase::ExecutingTools(response.tool_calls)
                }
            }
            Phase::ExecutingTools(calls) => {
                let mut results = Vec::with_capacity(calls.len());
                for call in &calls {
                    ctx.job.prop(
                        "message",
                        &format!("Calling `{}` with args: `{}`", call.name, call.input),
                    );
                    let result = ctx.registry.invoke(&ctx.tools, call).await;
                    info!("tool {}: {} bytes", call.name, result.content.len());
                    results.push(result);
                }
                ctx.client.append_tool_results(conversation, &results);
                Phase::AwaitingModelTurn
            }
            Phase::Done(text) => return Ok(text),
        };
    }
}
