use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::llm::{
    Conversation, LlmClient, StopReason, ToolCall, ToolDefinition, ToolResult, TurnResponse,
    Usage,
};

/// Replays scripted turns and records every tool-result batch it is handed.
pub struct MockLlmClient {
    responses: Mutex<Vec<TurnResponse>>,
    batches: Mutex<Vec<Vec<ToolResult>>>,
}

impl MockLlmClient {
    pub fn new(responses: Vec<TurnResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn batches(&self) -> Vec<Vec<ToolResult>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

impl LlmClient for MockLlmClient {
    fn new_conversation(&self, user_message: &str) -> Conversation {
        Conversation {
            messages: vec![Value::String(user_message.into())],
        }
    }

    fn append_user_message(&self, conversation: &mut Conversation, user_message: &str) {
        conversation
            .messages
            .push(Value::String(user_message.into()));
    }

    fn append_tool_results(&self, _conversation: &mut Conversation, results: &[ToolResult]) {
        self.batches.lock().unwrap().push(results.to_vec());
    }

    fn send_turn<'a>(
        &'a self,
        _system: &'a str,
        _conversation: &'a mut Conversation,
        _tools: &'a [ToolDefinition],
    ) -> Pin<Box<dyn Future<Output = Result<TurnResponse>> + Send + 'a>> {
        let mut responses = self.responses.lock().unwrap();
        let resp = if responses.is_empty() {
            Err(Error::Llm("mock script exhausted".into()))
        } else {
            Ok(responses.remove(0))
        };
        Box::pin(async move { resp })
    }
}

pub fn fake_usage() -> Usage {
    Usage {
        input_tokens: 0,
        output_tokens: 0,
    }
}

pub fn text_turn(text: &str) -> TurnResponse {
    TurnResponse {
        tool_calls: vec![],
        text: Some(text.into()),
        stop_reason: StopReason::EndTurn,
        usage: fake_usage(),
    }
}

pub fn tool_turn(calls: Vec<ToolCall>) -> TurnResponse {
    TurnResponse {
        tool_calls: calls,
        text: None,
        stop_reason: StopReason::ToolUse,
        usage: fake_usage(),
    }
}

pub fn tool_call(id: &str, name: &str, input: Value) -> ToolCall {
    ToolCall {
        id: id.into(),
        name: name.into(),
        input,
    }
}
