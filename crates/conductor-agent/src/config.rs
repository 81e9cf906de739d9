//! Model and runner configuration.

use serde::{Deserialize, Serialize};

/// Default chat-completions endpoint (OpenRouter).
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Model configuration for agent conversations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier (e.g. "anthropic/claude-sonnet-4", "deepseek-chat").
    pub model: String,

    /// Maximum tokens to generate in responses.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for response generation (0.0 to 2.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Chat-completions endpoint URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Optional API key override (if not using the environment variable).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub api_key: Option<String>,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "anthropic/claude-sonnet-4".into(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            base_url: default_base_url(),
            api_key: None,
        }
    }
}

impl ModelConfig {
    /// Create a configuration for the given model id.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set the maximum tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Set the chat-completions endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set an explicit API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Limits bounding the execution loop and delegation recursion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Maximum loop iterations (model calls) per agent invocation.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Maximum delegation depth below the top-level conversation.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_iterations() -> u32 {
    50
}

fn default_max_depth() -> usize {
    8
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_depth: default_max_depth(),
        }
    }
}

impl RunnerConfig {
    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the delegation depth cap.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
