//! Wire types for the Anthropic Messages API.
//!
//! Request-side blocks (`*Param`) are what we send; response-side blocks and
//! stream events are what we receive. Response enums carry an `Unknown`
//! variant so new block and event types deserialize without failing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message role; the API only accepts these two, strictly alternating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    #[default]
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

// ============================================================================
// Request types
// ============================================================================

/// Image media types accepted in base64 image sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageMediaType {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/gif")]
    Gif,
    #[serde(rename = "image/webp")]
    Webp,
}

impl ImageMediaType {
    /// Look up a lower-cased MIME type
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// Media type of base64 document sources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentMediaType {
    #[default]
    #[serde(rename = "application/pdf")]
    Pdf,
}

/// Source of an image block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    Base64 {
        media_type: ImageMediaType,
        data: String,
    },
    Url {
        url: String,
    },
}

/// Source of a document block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentSource {
    Base64 {
        media_type: DocumentMediaType,
        data: String,
    },
    Url {
        url: String,
    },
}

/// Content block sent in a request message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlockParam {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
        signature: String,
    },
    RedactedThinking {
        data: String,
    },
    Image {
        source: ImageSource,
    },
    Document {
        source: DocumentSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

impl ContentBlockParam {
    /// Create a text block
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a tool result block
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Create a tool use block
    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// A request message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageParam {
    pub role: MessageRole,
    pub content: Vec<ContentBlockParam>,
}

/// A system prompt block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SystemBlock {
    Text { text: String },
}

/// Tool input schema; the root is always an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub type_: String,
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl Default for InputSchema {
    fn default() -> Self {
        Self {
            type_: "object".to_string(),
            properties: Map::new(),
            required: Vec::new(),
        }
    }
}

/// A client tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParam {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: InputSchema,
}

/// Body of a `POST /v1/messages` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<MessageParam>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub system: Vec<SystemBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolParam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl MessageRequest {
    /// Create a request with the required fields
    pub fn new(model: impl Into<String>, max_tokens: u32, messages: Vec<MessageParam>) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            messages,
            system: Vec::new(),
            temperature: None,
            top_p: None,
            top_k: None,
            stop_sequences: Vec::new(),
            tools: Vec::new(),
            stream: None,
        }
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Citation attached to a text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextCitation {
    CharLocation {
        #[serde(default)]
        cited_text: String,
        #[serde(default)]
        document_index: u64,
        #[serde(default)]
        document_title: Option<String>,
        #[serde(default)]
        start_char_index: u64,
        #[serde(default)]
        end_char_index: u64,
    },
    PageLocation {
        #[serde(default)]
        cited_text: String,
        #[serde(default)]
        document_index: u64,
        #[serde(default)]
        document_title: Option<String>,
        #[serde(default)]
        start_page_number: u64,
        #[serde(default)]
        end_page_number: u64,
    },
    ContentBlockLocation {
        #[serde(default)]
        cited_text: String,
        #[serde(default)]
        document_index: u64,
        #[serde(default)]
        document_title: Option<String>,
        #[serde(default)]
        start_block_index: u64,
        #[serde(default)]
        end_block_index: u64,
    },
    WebSearchResultLocation {
        #[serde(default)]
        cited_text: String,
        #[serde(default)]
        encrypted_index: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        url: String,
    },
    SearchResultLocation {
        #[serde(default)]
        cited_text: String,
        #[serde(default)]
        search_result_index: u64,
        #[serde(default)]
        source: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        start_block_index: u64,
        #[serde(default)]
        end_block_index: u64,
    },
    #[serde(other)]
    Unknown,
}

/// One web search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub page_age: Option<String>,
    #[serde(default)]
    pub encrypted_content: String,
}

/// Failure reported by the web search tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchToolResultError {
    pub error_code: String,
}

/// Content of a web search tool result: hits or an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WebSearchToolResultContent {
    Results(Vec<WebSearchResult>),
    Error(WebSearchToolResultError),
}

/// Content block received in a response message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        citations: Option<Vec<TextCitation>>,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
        #[serde(default)]
        signature: String,
    },
    RedactedThinking {
        #[serde(default)]
        data: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ServerToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    WebSearchToolResult {
        tool_use_id: String,
        content: WebSearchToolResultContent,
    },
    #[serde(other)]
    Unknown,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    PauseTurn,
    Refusal,
    #[serde(other)]
    Unknown,
}

/// Token usage reported with a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u32>,
}

/// A complete response message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub role: MessageRole,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

// ============================================================================
// Stream events
// ============================================================================

/// Incremental update to the content block at an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    ThinkingDelta { thinking: String },
    SignatureDelta { signature: String },
    CitationsDelta { citation: TextCitation },
    #[serde(other)]
    Unknown,
}

/// Top-level changes carried by a `message_delta` event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageDeltaBody {
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
}

/// Cumulative usage carried by a `message_delta` event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDeltaUsage {
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(default)]
    pub cache_creation_input_tokens: Option<u32>,
    #[serde(default)]
    pub cache_read_input_tokens: Option<u32>,
}

/// Error payload of an in-band `error` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

/// One server-sent event of a streaming response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageStart {
        message: Message,
    },
    ContentBlockStart {
        index: usize,
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        index: usize,
        delta: ContentDelta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        #[serde(default)]
        delta: MessageDeltaBody,
        #[serde(default)]
        usage: MessageDeltaUsage,
    },
    MessageStop,
    Ping,
    Error {
        error: ApiError,
    },
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// Shorthand for a text delta event
    pub fn text_delta(index: usize, text: impl Into<String>) -> Self {
        Self::ContentBlockDelta {
            index,
            delta: ContentDelta::TextDelta { text: text.into() },
        }
    }

    /// Event type name as it appears on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::MessageStart { .. } => "message_start",
            StreamEvent::ContentBlockStart { .. } => "content_block_start",
            StreamEvent::ContentBlockDelta { .. } => "content_block_delta",
            StreamEvent::ContentBlockStop { .. } => "content_block_stop",
            StreamEvent::MessageDelta { .. } => "message_delta",
            StreamEvent::MessageStop => "message_stop",
            StreamEvent::Ping => "ping",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let mut req = MessageRequest::new(
            "claude-sonnet-4-20250514",
            1024,
            vec![MessageParam {
                role: MessageRole::User,
                content: vec![ContentBlockParam::text("Hello")],
            }],
        );
        req.system = vec![SystemBlock::Text {
            text: "Be brief.".to_string(),
        }];

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "claude-sonnet-4-20250514",
                "max_tokens": 1024,
                "messages": [{"role": "user", "content": [{"type": "text", "text": "Hello"}]}],
                "system": [{"type": "text", "text": "Be brief."}]
            })
        );
    }

    #[test]
    fn test_image_source_serialization() {
        let block = ContentBlockParam::Image {
            source: ImageSource::Base64 {
                media_type: ImageMediaType::Png,
                data: "AAEC".to_string(),
            },
        };
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "type": "image",
                "source": {"type": "base64", "media_type": "image/png", "data": "AAEC"}
            })
        );
    }

    #[test]
    fn test_message_deserialization_tolerates_unknown_blocks() {
        let msg: Message = serde_json::from_value(json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-20250514",
            "content": [
                {"type": "text", "text": "Hi", "citations": null},
                {"type": "container_upload", "file_id": "f_1"},
                {"type": "tool_use", "id": "toolu_1", "name": "lookup", "input": {"q": "rust"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 12, "output_tokens": 7}
        }))
        .unwrap();

        assert_eq!(msg.content.len(), 3);
        assert!(matches!(msg.content[1], ContentBlock::Unknown));
        assert_eq!(msg.stop_reason, Some(StopReason::ToolUse));
        assert_eq!(msg.usage.input_tokens, 12);
    }

    #[test]
    fn test_unknown_stop_reason() {
        let reason: StopReason = serde_json::from_value(json!("model_context_window_exceeded")).unwrap();
        assert_eq!(reason, StopReason::Unknown);
    }

    #[test]
    fn test_stream_event_deserialization() {
        let event: StreamEvent = serde_json::from_value(json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "text_delta", "text": "He"}
        }))
        .unwrap();
        assert_eq!(event, StreamEvent::text_delta(0, "He"));

        let ping: StreamEvent = serde_json::from_value(json!({"type": "ping"})).unwrap();
        assert_eq!(ping.kind(), "ping");

        let future: StreamEvent =
            serde_json::from_value(json!({"type": "brand_new_event", "x": 1})).unwrap();
        assert_eq!(future, StreamEvent::Unknown);
    }

    #[test]
    fn test_web_search_result_content() {
        let block: ContentBlock = serde_json::from_value(json!({
            "type": "web_search_tool_result",
            "tool_use_id": "srvtoolu_1",
            "content": {"type": "web_search_tool_result_error", "error_code": "max_uses_exceeded"}
        }))
        .unwrap();
        assert!(matches!(
            block,
            ContentBlock::WebSearchToolResult {
                content: WebSearchToolResultContent::Error(ref e),
                ..
            } if e.error_code == "max_uses_exceeded"
        ));
    }
}
