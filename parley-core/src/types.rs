//! Core types for the provider-neutral conversation model.

use crate::schema::Tool;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Role used for user turns
pub const ROLE_USER: &str = "user";

/// Role used for model turns
pub const ROLE_MODEL: &str = "model";

/// Inline binary payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// URI-referenced file payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

/// A function call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Map<String, Value>>,
}

/// The result of a function call, sent back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Map<String, Value>>,
}

/// Code generated for execution by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutableCode {
    pub language: String,
    pub code: String,
}

/// The outcome of executing [`ExecutableCode`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeExecutionResult {
    pub outcome: String,
    #[serde(default)]
    pub output: String,
}

/// One typed content item within a [`Content`] turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
        #[serde(default)]
        thought: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thought_signature: Option<Vec<u8>>,
    },
    InlineData(Blob),
    FileData(FileData),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
    ExecutableCode(ExecutableCode),
    CodeExecutionResult(CodeExecutionResult),
}

impl Part {
    /// Create a plain text part
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            thought: false,
            thought_signature: None,
        }
    }

    /// Create a thought part, optionally carrying the provider's signature
    pub fn thought(text: impl Into<String>, signature: Option<Vec<u8>>) -> Self {
        Part::Text {
            text: text.into(),
            thought: true,
            thought_signature: signature,
        }
    }

    /// Create an inline binary part
    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Part::InlineData(Blob {
            mime_type: mime_type.into(),
            data: data.into(),
        })
    }

    /// Create a file reference part
    pub fn file_data(mime_type: impl Into<String>, file_uri: impl Into<String>) -> Self {
        Part::FileData(FileData {
            mime_type: mime_type.into(),
            file_uri: file_uri.into(),
        })
    }

    /// Create a function call part
    pub fn function_call(
        id: impl Into<String>,
        name: impl Into<String>,
        args: Map<String, Value>,
    ) -> Self {
        Part::FunctionCall(FunctionCall {
            id: id.into(),
            name: name.into(),
            args: Some(args),
        })
    }

    /// Create a function response part
    pub fn function_response(
        id: impl Into<String>,
        name: impl Into<String>,
        response: Map<String, Value>,
    ) -> Self {
        Part::FunctionResponse(FunctionResponse {
            id: id.into(),
            name: name.into(),
            response: Some(response),
        })
    }

    /// Text of a text part, thought or not
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Whether this part is a thought
    pub fn is_thought(&self) -> bool {
        matches!(self, Part::Text { thought: true, .. })
    }
}

/// One role-tagged turn of conversation content
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a turn from parts
    pub fn new(role: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            role: role.into(),
            parts,
        }
    }

    /// Create a single text turn
    pub fn from_text(text: impl Into<String>, role: impl Into<String>) -> Self {
        Self::new(role, vec![Part::text(text)])
    }

    /// Create a user text turn
    pub fn user(text: impl Into<String>) -> Self {
        Self::from_text(text, ROLE_USER)
    }

    /// Create a model text turn
    pub fn model(text: impl Into<String>) -> Self {
        Self::from_text(text, ROLE_MODEL)
    }

    /// Whether any part is a function call
    pub fn has_function_call(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::FunctionCall(_)))
    }

    /// Whether any part is a function response
    pub fn has_function_response(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, Part::FunctionResponse(_)))
    }

    /// Concatenated text of all non-thought text parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter(|p| !p.is_thought())
            .filter_map(Part::as_text)
            .collect()
    }
}

/// Generation parameters attached to a request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentConfig {
    /// System instruction, as a turn of text parts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    /// Temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Top-p sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Top-k sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,

    /// Maximum number of tokens to generate; zero means unset
    #[serde(default)]
    pub max_output_tokens: u32,

    /// Tools available for the model to use
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

impl GenerateContentConfig {
    /// Set the system instruction from plain text
    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(Content::from_text(text, "system"));
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max output tokens
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Add a tool
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }
}

/// A provider-neutral generation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Conversation history
    pub contents: Vec<Content>,

    /// Generation config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<GenerateContentConfig>,
}

impl LlmRequest {
    /// Create a new request from conversation turns
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            config: None,
        }
    }

    /// Set the generation config
    pub fn with_config(mut self, config: GenerateContentConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// Token accounting for one response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: u64,
    pub candidates_token_count: u64,
    pub total_token_count: u64,
}

/// Finish reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    #[default]
    Unspecified,
    Stop,
    MaxTokens,
}

/// A single source attribution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Citations attached to a response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationMetadata {
    pub citations: Vec<Citation>,
}

/// A provider-neutral response, either partial (streaming) or complete
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_metadata: Option<CitationMetadata>,
    /// Set on incremental responses produced while streaming
    #[serde(default)]
    pub partial: bool,
    /// Set on the single final response of a turn
    #[serde(default)]
    pub turn_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LlmResponse {
    /// Create a partial response carrying a single part
    pub fn partial(part: Part) -> Self {
        Self {
            content: Some(Content::new(ROLE_MODEL, vec![part])),
            partial: true,
            ..Default::default()
        }
    }

    /// Create an error response
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: Some(code.into()),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Concatenated non-thought text of the response content
    pub fn text(&self) -> String {
        self.content.as_ref().map(Content::text).unwrap_or_default()
    }

    /// Function calls requested by the model
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| match p {
                Part::FunctionCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Provider identifier, e.g. "anthropic"
    pub provider: String,
    /// Model name sent on the wire
    pub name: String,
}

impl ModelInfo {
    /// Create model info
    pub fn new(provider: impl Into<String>, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            provider: provider.into(),
            name: name.into(),
        })
    }
}
