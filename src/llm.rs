use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::Result;

/// A tool invocation requested by the model.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// Exactly one of these is produced for every `ToolCall`.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub name: String,
    pub content: String,
    pub is_error: bool,
}

#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Opaque conversation state; each provider stores messages in its native format.
#[derive(Debug)]
pub struct Conversation {
    pub messages: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    ToolUse,
    EndTurn,
    MaxTokens,
    Unknown,
}

/// One model reply. An empty `tool_calls` means the turn is finished and
/// `text` is the answer.
#[derive(Debug)]
pub struct TurnResponse {
    pub tool_calls: Vec<ToolCall>,
    pub text: Option<String>,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

pub trait LlmClient: Send + Sync {
    fn new_conversation(&self, user_message: &str) -> Conversation;
    /// Follow-up question in an existing conversation.
    fn append_user_message(&self, conversation: &mut Conversation, user_message: &str);
    /// Appends one round's results together; providers must not split a round.
    fn append_tool_results(&self, conversation: &mut Conversation, results: &[ToolResult]);
    /// Send the conversation and record the reply in it, tool calls included.
    fn send_turn<'a>(
        &'a self,
        system: &'a str,
        conversation: &'a mut Conversation,
        tools: &'a [ToolDefinition],
    ) -> Pin<Box<dyn Future<Output = Result<TurnResponse>> + Send + 'a>>;
}
