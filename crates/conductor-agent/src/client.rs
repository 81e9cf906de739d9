//! Chat-completions model client.
//!
//! [`ChatModel`] is the seam between the engine and the language model: it
//! takes a conversation plus tool schemas and returns one assistant reply.
//! [`HttpChatClient`] implements it over the OpenAI-compatible
//! chat-completions protocol used by OpenRouter, DeepSeek and friends.
//! Transport and auth failures surface as [`AgentError::ModelInvocation`]
//! and are fatal to the calling loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use conductor_core::{Message, MessageRole, ToolCall, ToolDefinition};

use crate::config::ModelConfig;
use crate::error::{AgentError, Result};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// One assistant reply from the model.
#[derive(Debug, Clone, Default)]
pub struct AssistantReply {
    /// Text content; empty when the model only requested tool calls.
    pub content: String,

    /// Tool calls the model wants executed, in request order.
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantReply {
    /// Create a text-only reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Create a reply carrying tool calls.
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
        }
    }

    /// Convert into the conversation message to append.
    pub fn to_message(&self) -> Message {
        if self.tool_calls.is_empty() {
            Message::assistant(&self.content)
        } else {
            Message::assistant_with_tools(&self.content, self.tool_calls.clone())
        }
    }
}

/// The model-call seam.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Invoke the model with a conversation and the visible tool schemas.
    ///
    /// Must fail loudly on transport or auth failure; the engine never
    /// retries on its own.
    async fn invoke(&self, messages: &[Message], tools: &[ToolDefinition])
        -> Result<AssistantReply>;
}

/// HTTP client for OpenAI-compatible chat-completions endpoints.
#[derive(Clone)]
pub struct HttpChatClient {
    client: reqwest::Client,
    api_key: String,
    config: ModelConfig,
}

impl HttpChatClient {
    /// Create a client with an explicit API key.
    pub fn new(api_key: impl Into<String>, config: ModelConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            config,
        }
    }

    /// Create a client from the configuration, falling back to the
    /// `OPENROUTER_API_KEY` environment variable for the key.
    pub fn from_env(config: ModelConfig) -> Result<Self> {
        let api_key = match config.api_key.clone() {
            Some(key) => key,
            None => std::env::var(API_KEY_ENV).map_err(|_| {
                AgentError::Configuration(format!("missing {} environment variable", API_KEY_ENV))
            })?,
        };
        Ok(Self::new(api_key, config))
    }
}

#[async_trait]
impl ChatModel for HttpChatClient {
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<AssistantReply> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(WireMessage::from_message).collect(),
            tools: if tools.is_empty() {
                None
            } else {
                Some(tools.iter().map(WireTool::from_definition).collect())
            },
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        };

        trace!(model = %request.model, messages = request.messages.len(), "sending chat request");

        let response = self
            .client
            .post(&self.config.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::ModelInvocation(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::ModelInvocation(format!(
                "API error {}: {}",
                status, text
            )));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ResponseParse(format!("failed to parse response: {}", e)))?;

        debug!(
            tokens = response.usage.as_ref().map_or(0, |u| u.total_tokens),
            "chat response received"
        );

        response.into_reply()
    }
}

/// Chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,

    /// Conversation messages.
    pub messages: Vec<WireMessage>,

    /// Available tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<WireTool>>,

    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A message as sent over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// Role of the message sender.
    pub role: String,

    /// Text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool calls made by the assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,

    /// Tool call id for tool result messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl WireMessage {
    /// Convert from the internal message type.
    pub fn from_message(msg: &Message) -> Self {
        let role = match msg.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        };
        Self {
            role: role.to_string(),
            content: Some(msg.content.clone()),
            tool_calls: msg
                .tool_calls
                .as_ref()
                .map(|calls| calls.iter().map(WireToolCall::from_tool_call).collect()),
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

/// Tool call in a wire message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireToolCall {
    /// Unique identifier for this tool call.
    pub id: String,

    /// Type of the tool call (always "function").
    #[serde(rename = "type")]
    pub call_type: String,

    /// Function details.
    pub function: WireFunctionCall,
}

impl WireToolCall {
    /// Convert from the internal tool call type.
    pub fn from_tool_call(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            call_type: "function".to_string(),
            function: WireFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        }
    }

    /// Convert to the internal type. The argument blob is carried verbatim;
    /// parsing happens at dispatch time.
    pub fn to_tool_call(&self) -> ToolCall {
        ToolCall::from_raw(&self.id, &self.function.name, &self.function.arguments)
    }
}

/// Function payload inside a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFunctionCall {
    /// Name of the function to call.
    pub name: String,

    /// JSON-encoded arguments.
    pub arguments: String,
}

/// Tool definition as advertised over the wire.
#[derive(Debug, Clone, Serialize)]
pub struct WireTool {
    /// Type of the tool (always "function").
    #[serde(rename = "type")]
    pub tool_type: String,

    /// Function definition.
    pub function: WireFunctionDef,
}

impl WireTool {
    /// Convert from the internal tool definition.
    pub fn from_definition(def: &ToolDefinition) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: WireFunctionDef {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def.parameters.clone(),
            },
        }
    }
}

/// Function schema inside a tool definition.
#[derive(Debug, Clone, Serialize)]
pub struct WireFunctionDef {
    /// Name of the function.
    pub name: String,

    /// Description of what the function does.
    pub description: String,

    /// JSON Schema for parameters.
    pub parameters: serde_json::Value,
}

/// Chat completion response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Completion choices.
    pub choices: Vec<ChatChoice>,

    /// Token usage information.
    pub usage: Option<ChatUsage>,
}

impl ChatResponse {
    /// Reduce to the first choice's message.
    pub fn into_reply(self) -> Result<AssistantReply> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::ResponseParse("response contained no choices".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .iter()
            .map(WireToolCall::to_tool_call)
            .collect();

        Ok(AssistantReply {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }
}

/// A choice in the completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// The message for this choice.
    pub message: WireReply,

    /// Finish reason (stop, tool_calls, length, etc.).
    pub finish_reason: Option<String>,
}

/// Assistant message in a completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct WireReply {
    /// Text content of the response.
    pub content: Option<String>,

    /// Tool calls the model wants to make.
    pub tool_calls: Option<Vec<WireToolCall>>,
}

/// Token usage information.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,

    /// Tokens in the completion.
    pub completion_tokens: u32,

    /// Total tokens used.
    pub total_tokens: u32,
}
