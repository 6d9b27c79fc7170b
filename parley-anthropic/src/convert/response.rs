//! Messages API responses to neutral responses.

use crate::wire::*;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use parley_core::types::*;
use serde_json::{json, Map, Value};

/// Error code of the response produced for a missing message
pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN_ERROR";

/// Placeholder text for thinking the provider redacted
pub const REDACTED_THINKING_TEXT: &str = "[thinking redacted]";

/// Function name carried by web search results
pub const WEB_SEARCH_TOOL_NAME: &str = "web_search";

/// Translate a complete message into a neutral response.
///
/// A missing message still yields a response, flagged with
/// [`UNKNOWN_ERROR_CODE`], so the caller always has something to inspect.
pub fn message_to_response(message: Option<&Message>) -> LlmResponse {
    let Some(message) = message else {
        return LlmResponse::error(UNKNOWN_ERROR_CODE, "nil message received");
    };

    let mut parts = Vec::with_capacity(message.content.len());
    let mut citations = Vec::new();

    for block in &message.content {
        if let ContentBlock::Text {
            citations: Some(cs),
            ..
        } = block
        {
            citations.extend(cs.iter().filter_map(citation_to_neutral));
        }
        if let Some(part) = content_block_to_part(block) {
            parts.push(part);
        }
    }

    LlmResponse {
        content: Some(Content::new(ROLE_MODEL, parts)),
        usage_metadata: Some(usage_to_metadata(&message.usage)),
        finish_reason: Some(stop_reason_to_finish_reason(message.stop_reason)),
        citation_metadata: (!citations.is_empty()).then_some(CitationMetadata { citations }),
        ..Default::default()
    }
}

/// Translate one response block; unknown blocks yield `None`
pub fn content_block_to_part(block: &ContentBlock) -> Option<Part> {
    match block {
        ContentBlock::Text { text, .. } => Some(Part::text(text.clone())),
        ContentBlock::Thinking {
            thinking,
            signature,
        } => Some(Part::thought(thinking.clone(), Some(decode_signature(signature)))),
        ContentBlock::RedactedThinking { .. } => Some(Part::thought(REDACTED_THINKING_TEXT, None)),
        ContentBlock::ToolUse { id, name, input } | ContentBlock::ServerToolUse { id, name, input } => {
            Some(Part::function_call(id.clone(), name.clone(), input_to_args(name, input)))
        }
        ContentBlock::WebSearchToolResult {
            tool_use_id,
            content,
        } => Some(Part::function_response(
            tool_use_id.clone(),
            WEB_SEARCH_TOOL_NAME,
            web_search_to_response(content),
        )),
        ContentBlock::Unknown => {
            tracing::debug!("skipping unknown content block");
            None
        }
    }
}

fn decode_signature(signature: &str) -> Vec<u8> {
    BASE64.decode(signature).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "thinking signature is not valid base64");
        Vec::new()
    })
}

/// Tool input as an argument map; anything but an object becomes empty
fn input_to_args(name: &str, input: &Value) -> Map<String, Value> {
    match input {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            tracing::debug!(tool = %name, input = %other, "tool input is not an object");
            Map::new()
        }
    }
}

fn web_search_to_response(content: &WebSearchToolResultContent) -> Map<String, Value> {
    let mut response = Map::new();
    match content {
        WebSearchToolResultContent::Results(results) => {
            let results = results
                .iter()
                .map(|r| json!({"title": r.title, "url": r.url, "page_age": r.page_age}))
                .collect();
            response.insert("results".into(), Value::Array(results));
        }
        WebSearchToolResultContent::Error(err) => {
            response.insert("error".into(), Value::String(err.error_code.clone()));
        }
    }
    response
}

/// Map a wire citation to the neutral shape; unknown kinds yield `None`
pub fn citation_to_neutral(citation: &TextCitation) -> Option<Citation> {
    let citation = match citation {
        TextCitation::CharLocation {
            document_title,
            start_char_index,
            end_char_index,
            ..
        } => Citation {
            start_index: Some(*start_char_index),
            end_index: Some(*end_char_index),
            title: document_title.clone(),
            uri: None,
        },
        TextCitation::PageLocation { document_title, .. }
        | TextCitation::ContentBlockLocation { document_title, .. } => Citation {
            title: document_title.clone(),
            ..Default::default()
        },
        TextCitation::WebSearchResultLocation { title, url, .. } => Citation {
            title: title.clone(),
            uri: Some(url.clone()),
            ..Default::default()
        },
        TextCitation::SearchResultLocation { title, .. } => Citation {
            title: title.clone(),
            ..Default::default()
        },
        TextCitation::Unknown => return None,
    };
    Some(citation)
}

/// Token usage; the total is always recomputed as input plus output
pub fn usage_to_metadata(usage: &Usage) -> UsageMetadata {
    let prompt = u64::from(usage.input_tokens);
    let candidates = u64::from(usage.output_tokens);
    UsageMetadata {
        prompt_token_count: prompt,
        candidates_token_count: candidates,
        total_token_count: prompt + candidates,
    }
}

pub fn stop_reason_to_finish_reason(reason: Option<StopReason>) -> FinishReason {
    match reason {
        Some(StopReason::EndTurn | StopReason::StopSequence | StopReason::ToolUse) => {
            FinishReason::Stop
        }
        Some(StopReason::MaxTokens) => FinishReason::MaxTokens,
        _ => FinishReason::Unspecified,
    }
}

/// Partial response for a streamed text fragment
pub fn partial_text_response(text: impl Into<String>) -> LlmResponse {
    LlmResponse::partial(Part::text(text))
}

/// Partial response for a streamed thinking fragment
pub fn partial_thought_response(thinking: impl Into<String>) -> LlmResponse {
    LlmResponse::partial(Part::thought(thinking, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(content: Vec<ContentBlock>) -> Message {
        Message {
            id: "msg_1".into(),
            content,
            stop_reason: Some(StopReason::EndTurn),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_nil_message() {
        let resp = message_to_response(None);
        assert_eq!(resp.error_code.as_deref(), Some(UNKNOWN_ERROR_CODE));
        assert!(resp.content.is_none());
    }

    #[test]
    fn test_text_message() {
        let resp = message_to_response(Some(&message(vec![ContentBlock::Text {
            text: "Hello".into(),
            citations: None,
        }])));

        let content = resp.content.unwrap();
        assert_eq!(content.role, ROLE_MODEL);
        assert_eq!(content.parts, vec![Part::text("Hello")]);
        assert_eq!(resp.finish_reason, Some(FinishReason::Stop));
        assert!(resp.citation_metadata.is_none());
        assert!(!resp.partial);
    }

    #[test]
    fn test_usage_arithmetic() {
        for (input, output) in [(10u32, 20u32), (0, 0), (u32::MAX, u32::MAX)] {
            let usage = usage_to_metadata(&Usage {
                input_tokens: input,
                output_tokens: output,
                cache_read_input_tokens: Some(5),
                ..Default::default()
            });
            assert_eq!(usage.prompt_token_count, u64::from(input));
            assert_eq!(usage.candidates_token_count, u64::from(output));
            assert_eq!(
                usage.total_token_count,
                u64::from(input) + u64::from(output)
            );
        }
    }

    #[test]
    fn test_finish_reasons() {
        let cases = [
            (Some(StopReason::EndTurn), FinishReason::Stop),
            (Some(StopReason::StopSequence), FinishReason::Stop),
            (Some(StopReason::ToolUse), FinishReason::Stop),
            (Some(StopReason::MaxTokens), FinishReason::MaxTokens),
            (Some(StopReason::PauseTurn), FinishReason::Unspecified),
            (Some(StopReason::Refusal), FinishReason::Unspecified),
            (Some(StopReason::Unknown), FinishReason::Unspecified),
            (None, FinishReason::Unspecified),
        ];
        for (reason, want) in cases {
            assert_eq!(stop_reason_to_finish_reason(reason), want, "{:?}", reason);
        }
    }

    #[test]
    fn test_thinking_blocks() {
        let resp = message_to_response(Some(&message(vec![
            ContentBlock::Thinking {
                thinking: "Let me think".into(),
                signature: BASE64.encode(b"sig"),
            },
            ContentBlock::Thinking {
                thinking: "bad sig".into(),
                signature: "%%%".into(),
            },
            ContentBlock::RedactedThinking {
                data: "opaque".into(),
            },
        ])));

        let parts = resp.content.unwrap().parts;
        assert_eq!(parts[0], Part::thought("Let me think", Some(b"sig".to_vec())));
        assert_eq!(parts[1], Part::thought("bad sig", Some(Vec::new())));
        assert_eq!(parts[2], Part::thought(REDACTED_THINKING_TEXT, None));
    }

    #[test]
    fn test_tool_use_blocks() {
        let resp = message_to_response(Some(&message(vec![
            ContentBlock::ToolUse {
                id: "toolu_1".into(),
                name: "get_weather".into(),
                input: json!({"location": "Paris"}),
            },
            ContentBlock::ServerToolUse {
                id: "srvtoolu_1".into(),
                name: "web_search".into(),
                input: json!("not an object"),
            },
            ContentBlock::ToolUse {
                id: "toolu_2".into(),
                name: "now".into(),
                input: Value::Null,
            },
        ])));

        let calls = resp.function_calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].id, "toolu_1");
        assert_eq!(
            calls[0].args.as_ref().and_then(|a| a.get("location")),
            Some(&json!("Paris"))
        );
        assert_eq!(calls[1].args, Some(Map::new()));
        assert_eq!(calls[2].args, Some(Map::new()));
    }

    #[test]
    fn test_web_search_results() {
        let resp = message_to_response(Some(&message(vec![
            ContentBlock::WebSearchToolResult {
                tool_use_id: "srvtoolu_1".into(),
                content: WebSearchToolResultContent::Results(vec![WebSearchResult {
                    title: "Rust".into(),
                    url: "https://www.rust-lang.org".into(),
                    page_age: Some("2 days".into()),
                    encrypted_content: "enc".into(),
                }]),
            },
            ContentBlock::WebSearchToolResult {
                tool_use_id: "srvtoolu_2".into(),
                content: WebSearchToolResultContent::Error(WebSearchToolResultError {
                    error_code: "max_uses_exceeded".into(),
                }),
            },
        ])));

        let parts = resp.content.unwrap().parts;
        let Part::FunctionResponse(ok) = &parts[0] else {
            panic!("expected function response, got {:?}", parts[0]);
        };
        assert_eq!(ok.id, "srvtoolu_1");
        assert_eq!(ok.name, WEB_SEARCH_TOOL_NAME);
        assert_eq!(
            Value::Object(ok.response.clone().unwrap()),
            json!({"results": [{"title": "Rust", "url": "https://www.rust-lang.org", "page_age": "2 days"}]})
        );

        let Part::FunctionResponse(err) = &parts[1] else {
            panic!("expected function response, got {:?}", parts[1]);
        };
        assert_eq!(
            Value::Object(err.response.clone().unwrap()),
            json!({"error": "max_uses_exceeded"})
        );
    }

    #[test]
    fn test_unknown_blocks_are_skipped() {
        let msg: Message = serde_json::from_value(json!({
            "content": [
                {"type": "mcp_tool_use", "id": "x"},
                {"type": "text", "text": "kept"}
            ],
            "stop_reason": "something_new"
        }))
        .unwrap();

        let resp = message_to_response(Some(&msg));
        assert_eq!(resp.content.unwrap().parts, vec![Part::text("kept")]);
        assert_eq!(resp.finish_reason, Some(FinishReason::Unspecified));
    }

    #[test]
    fn test_citations_are_collected() {
        let resp = message_to_response(Some(&message(vec![
            ContentBlock::Text {
                text: "a".into(),
                citations: Some(vec![
                    TextCitation::CharLocation {
                        cited_text: "x".into(),
                        document_index: 0,
                        document_title: Some("Doc".into()),
                        start_char_index: 3,
                        end_char_index: 9,
                    },
                    TextCitation::Unknown,
                ]),
            },
            ContentBlock::Text {
                text: "b".into(),
                citations: Some(vec![
                    TextCitation::WebSearchResultLocation {
                        cited_text: "y".into(),
                        encrypted_index: "e".into(),
                        title: Some("Site".into()),
                        url: "https://example.com".into(),
                    },
                    TextCitation::SearchResultLocation {
                        cited_text: "z".into(),
                        search_result_index: 0,
                        source: "kb".into(),
                        title: Some("Result".into()),
                        start_block_index: 0,
                        end_block_index: 1,
                    },
                ]),
            },
        ])));

        let citations = resp.citation_metadata.unwrap().citations;
        assert_eq!(
            citations,
            vec![
                Citation {
                    start_index: Some(3),
                    end_index: Some(9),
                    title: Some("Doc".into()),
                    uri: None,
                },
                Citation {
                    title: Some("Site".into()),
                    uri: Some("https://example.com".into()),
                    ..Default::default()
                },
                Citation {
                    title: Some("Result".into()),
                    ..Default::default()
                },
            ]
        );
    }

    #[test]
    fn test_partial_responses() {
        let text = partial_text_response("He");
        assert!(text.partial && !text.turn_complete);
        assert_eq!(text.text(), "He");

        let thought = partial_thought_response("hmm");
        assert!(thought.content.unwrap().parts[0].is_thought());
    }
}
