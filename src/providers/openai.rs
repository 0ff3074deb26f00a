use std::future::Future;
use std::pin::Pin;

use log::warn;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::llm::{
    Conversation, LlmClient, StopReason, ToolCall, ToolDefinition, ToolResult, TurnResponse, Usage,
};

/// Chat Completions client. Also serves Gemini through its OpenAI-compatible
/// endpoint, which is how the default model is reached.
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiToolCall {
    id: String,
    function: ApiFunction,
}

#[derive(Debug, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl From<ApiUsage> for Usage {
    fn from(u: ApiUsage) -> Self {
        Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        }
    }
}

impl ChoiceMessage {
    /// The reply as it must be replayed on the next request, tool calls included.
    fn history_entry(&self) -> Value {
        let mut entry = json!({ "role": "assistant" });
        if let Some(content) = &self.content {
            entry["content"] = json!(content);
        }
        if let Some(calls) = &self.tool_calls {
            entry["tool_calls"] = calls
                .iter()
                .map(|c| {
                    json!({
                        "id": c.id,
                        "type": "function",
                        "function": {"name": c.function.name, "arguments": c.function.arguments},
                    })
                })
                .collect();
        }
        entry
    }
}

impl ApiToolCall {
    /// Arguments arrive as a JSON string. Unparseable ones become `{}` so the
    /// tool's own validation reports the missing fields back to the model.
    fn into_tool_call(self) -> ToolCall {
        let input = serde_json::from_str(&self.function.arguments).unwrap_or_else(|e| {
            warn!(
                "tool call {} has unparseable arguments: {e}",
                self.function.name
            );
            json!({})
        });
        ToolCall {
            id: self.id,
            name: self.function.name,
            input,
        }
    }
}

fn stop_reason(finish_reason: Option<&str>) -> StopReason {
    match finish_reason {
        Some("tool_calls") => StopReason::ToolUse,
        Some("stop") => StopReason::EndTurn,
        Some("length") => StopReason::MaxTokens,
        _ => StopReason::Unknown,
    }
}

fn function_tool(def: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": def.name,
            "description": def.description,
            "parameters": def.input_schema,
        }
    })
}

impl OpenAIProvider {
    pub fn new(api_key: String, model: String, max_tokens: u32, base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("upcheck/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
            max_tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request_body(&self, system: &str, history: &[Value], tools: &[ToolDefinition]) -> Value {
        let messages: Vec<Value> = std::iter::once(json!({"role": "system", "content": system}))
            .chain(history.iter().cloned())
            .collect();
        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": messages,
        });
        if !tools.is_empty() {
            body["tools"] = tools.iter().map(function_tool).collect();
        }
        body
    }
}

fn user_entry(text: &str) -> Value {
    json!({"role": "user", "content": text})
}

impl LlmClient for OpenAIProvider {
    fn new_conversation(&self, user_message: &str) -> Conversation {
        Conversation {
            messages: vec![user_entry(user_message)],
        }
    }

    fn append_user_message(&self, conversation: &mut Conversation, user_message: &str) {
        conversation.messages.push(user_entry(user_message));
    }

    fn append_tool_results(&self, conversation: &mut Conversation, results: &[ToolResult]) {
        conversation.messages.extend(results.iter().map(|r| {
            json!({
                "role": "tool",
                "tool_call_id": r.tool_call_id,
                "name": r.name,
                "content": r.content,
            })
        }));
    }

    fn send_turn<'a>(
        &'a self,
        system: &'a str,
        conversation: &'a mut Conversation,
        tools: &'a [ToolDefinition],
    ) -> Pin<Box<dyn Future<Output = Result<TurnResponse>> + Send + 'a>> {
        Box::pin(async move {
            let body = self.request_body(system, &conversation.messages, tools);
            let mut req = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .json(&body);
            if !self.api_key.is_empty() {
                req = req.bearer_auth(&self.api_key);
            }

            let resp = req.send().await?;
            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(Error::Llm(format!("{status}: {body}")));
            }

            let response: ChatResponse = resp.json().await?;
            let choice = response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| Error::Llm("no choices in response".into()))?;
            conversation.messages.push(choice.message.history_entry());

            let message = choice.message;
            Ok(TurnResponse {
                tool_calls: message
                    .tool_calls
                    .unwrap_or_default()
                    .into_iter()
                    .map(ApiToolCall::into_tool_call)
                    .collect(),
                text: message.content.filter(|c| !c.trim().is_empty()),
                stop_reason: stop_reason(choice.finish_reason.as_deref()),
                usage: response.usage.map(Usage::from).unwrap_or_default(),
            })
        })
    }
}
