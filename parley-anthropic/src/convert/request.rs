//! Neutral turns to Messages API request messages.

use crate::convert::tools::tools_to_params;
use crate::wire::*;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use parley_core::error::ParleyError;
use parley_core::types::*;
use serde_json::{Map, Value};

/// Synthetic turn appended when the history is empty
pub const EMPTY_HISTORY_PROMPT: &str = "Handle the requests as specified in the System Instruction.";

/// Synthetic turn appended when the history ends on a non-user turn
pub const CONTINUE_PROMPT: &str = "Continue processing previous requests as instructed.";

/// Convert neutral turns to request messages.
///
/// Empty input yields an empty list. Turns whose parts convert to nothing are
/// dropped, and consecutive messages with the same role are merged so the
/// result strictly alternates.
pub fn contents_to_messages(contents: &[Content]) -> Result<Vec<MessageParam>, ParleyError> {
    let mut messages = Vec::with_capacity(contents.len());
    for (turn, content) in contents.iter().enumerate() {
        match content_to_message(turn, content)? {
            Some(msg) => messages.push(msg),
            None => tracing::debug!(turn, "dropping turn with no convertible parts"),
        }
    }

    Ok(merge_consecutive_messages(messages))
}

/// The wire role a turn translates to.
///
/// Function responses force `user` and function calls force `assistant`,
/// regardless of the declared role.
pub fn effective_role(content: &Content) -> Result<MessageRole, ParleyError> {
    if content.has_function_response() {
        return Ok(MessageRole::User);
    }
    if content.has_function_call() {
        return Ok(MessageRole::Assistant);
    }
    map_role(&content.role)
}

fn map_role(role: &str) -> Result<MessageRole, ParleyError> {
    match role.to_ascii_lowercase().as_str() {
        "user" => Ok(MessageRole::User),
        "model" | "assistant" => Ok(MessageRole::Assistant),
        _ => Err(ParleyError::unsupported_role(role)),
    }
}

fn content_to_message(turn: usize, content: &Content) -> Result<Option<MessageParam>, ParleyError> {
    if content.parts.is_empty() {
        return Ok(None);
    }

    let role = effective_role(content).map_err(|e| e.in_conversion(turn, None))?;

    let mut blocks = Vec::with_capacity(content.parts.len());
    for (index, part) in content.parts.iter().enumerate() {
        if let Some(block) = part_to_block(part).map_err(|e| e.in_conversion(turn, Some(index)))? {
            blocks.push(block);
        }
    }

    if blocks.is_empty() {
        return Ok(None);
    }

    Ok(Some(MessageParam {
        role,
        content: blocks,
    }))
}

/// Convert one part to a request block; `None` means the part has no content
pub fn part_to_block(part: &Part) -> Result<Option<ContentBlockParam>, ParleyError> {
    match part {
        Part::Text { text, .. } if text.is_empty() => Ok(None),
        Part::Text {
            text,
            thought: true,
            thought_signature: Some(signature),
        } if !signature.is_empty() => Ok(Some(ContentBlockParam::Thinking {
            thinking: text.clone(),
            signature: BASE64.encode(signature),
        })),
        Part::Text { text, thought, .. } => {
            if *thought {
                tracing::trace!("thought part without signature sent as plain text");
            }
            Ok(Some(ContentBlockParam::text(text.clone())))
        }
        Part::InlineData(blob) => inline_data_to_block(blob).map(Some),
        Part::FileData(file) => file_data_to_block(file).map(Some),
        Part::FunctionResponse(resp) => function_response_to_block(resp).map(Some),
        Part::FunctionCall(call) => Ok(Some(function_call_to_block(call))),
        Part::ExecutableCode(_) => Err(ParleyError::unsupported_part_type("executable_code")),
        Part::CodeExecutionResult(_) => {
            Err(ParleyError::unsupported_part_type("code_execution_result"))
        }
    }
}

fn image_media_type(mime_type: &str) -> Result<ImageMediaType, ParleyError> {
    ImageMediaType::from_mime(mime_type).ok_or_else(|| ParleyError::unsupported_media_type(mime_type))
}

fn inline_data_to_block(blob: &Blob) -> Result<ContentBlockParam, ParleyError> {
    let mime_type = blob.mime_type.to_ascii_lowercase();

    if mime_type.starts_with("image/") {
        return Ok(ContentBlockParam::Image {
            source: ImageSource::Base64 {
                media_type: image_media_type(&mime_type)?,
                data: BASE64.encode(&blob.data),
            },
        });
    }

    if mime_type == "application/pdf" {
        return Ok(ContentBlockParam::Document {
            source: DocumentSource::Base64 {
                media_type: DocumentMediaType::Pdf,
                data: BASE64.encode(&blob.data),
            },
        });
    }

    Err(ParleyError::unsupported_media_type(mime_type))
}

fn file_data_to_block(file: &FileData) -> Result<ContentBlockParam, ParleyError> {
    let mime_type = file.mime_type.to_ascii_lowercase();

    if mime_type.starts_with("image/") {
        image_media_type(&mime_type)?;
        return Ok(ContentBlockParam::Image {
            source: ImageSource::Url {
                url: file.file_uri.clone(),
            },
        });
    }

    if mime_type == "application/pdf" {
        return Ok(ContentBlockParam::Document {
            source: DocumentSource::Url {
                url: file.file_uri.clone(),
            },
        });
    }

    Err(ParleyError::unsupported_media_type(mime_type))
}

fn function_response_to_block(resp: &FunctionResponse) -> Result<ContentBlockParam, ParleyError> {
    let content = match &resp.response {
        Some(response) => serde_json::to_string(response)?,
        None => String::new(),
    };

    let tool_use_id = if resp.id.is_empty() {
        resp.name.clone()
    } else {
        resp.id.clone()
    };

    Ok(ContentBlockParam::tool_result(tool_use_id, content))
}

fn function_call_to_block(call: &FunctionCall) -> ContentBlockParam {
    let input = Value::Object(call.args.clone().unwrap_or_else(Map::new));
    ContentBlockParam::tool_use(call.id.clone(), call.name.clone(), input)
}

/// Convert a system instruction to system blocks, one per non-empty text part
pub fn system_instruction_to_system(instruction: Option<&Content>) -> Vec<SystemBlock> {
    instruction
        .into_iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(Part::as_text)
        .filter(|text| !text.is_empty())
        .map(|text| SystemBlock::Text {
            text: text.to_string(),
        })
        .collect()
}

/// Merge consecutive messages with the same role, preserving block order
pub fn merge_consecutive_messages(messages: Vec<MessageParam>) -> Vec<MessageParam> {
    let mut merged: Vec<MessageParam> = Vec::with_capacity(messages.len());
    for msg in messages {
        match merged.last_mut() {
            Some(last) if last.role == msg.role => {
                tracing::trace!(role = msg.role.as_str(), "merging consecutive messages");
                last.content.extend(msg.content);
            }
            _ => merged.push(msg),
        }
    }
    merged
}

/// Append a synthetic user turn unless the history already ends on one.
///
/// Turns that would be dropped as empty are skipped when finding the last
/// turn, so the translated messages always end on `user`. Returns whether a
/// turn was appended. A last turn with an unsupported role counts as
/// non-user; translation reports the role error afterwards.
pub fn ensure_user_terminated(contents: &mut Vec<Content>) -> bool {
    let prompt = match contents.iter().rev().find(|c| has_content(c)) {
        None => EMPTY_HISTORY_PROMPT,
        Some(last) if matches!(effective_role(last), Ok(MessageRole::User)) => return false,
        Some(_) => CONTINUE_PROMPT,
    };

    tracing::debug!(prompt, "appending synthetic user turn");
    contents.push(Content::user(prompt));
    true
}

/// Whether any part of the turn survives translation as a block
fn has_content(content: &Content) -> bool {
    content
        .parts
        .iter()
        .any(|part| !matches!(part, Part::Text { text, .. } if text.is_empty()))
}

/// Build the full request body for a model call
pub fn build_message_request(
    model: &str,
    default_max_tokens: u32,
    req: &LlmRequest,
) -> Result<MessageRequest, ParleyError> {
    let messages = contents_to_messages(&req.contents)?;
    let mut params = MessageRequest::new(model, default_max_tokens, messages);

    if let Some(config) = &req.config {
        params.system = system_instruction_to_system(config.system_instruction.as_ref());
        params.temperature = config.temperature.map(f64::from);
        params.top_p = config.top_p.map(f64::from);
        params.top_k = config.top_k;
        if !config.stop_sequences.is_empty() {
            params.stop_sequences = config.stop_sequences.clone();
        }
        if config.max_output_tokens > 0 {
            params.max_tokens = config.max_output_tokens;
        }
        params.tools = tools_to_params(&config.tools);
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::schema::{FunctionDeclaration, Tool};
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn roles(messages: &[MessageParam]) -> Vec<MessageRole> {
        messages.iter().map(|m| m.role).collect()
    }

    #[test]
    fn test_empty_contents() {
        assert!(contents_to_messages(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_multi_turn_roles() {
        let contents = vec![
            Content::user("Hello"),
            Content::model("Hi there!"),
            Content::from_text("How are you?", "USER"),
        ];
        let messages = contents_to_messages(&contents).unwrap();
        assert_eq!(
            roles(&messages),
            vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]
        );
    }

    #[test]
    fn test_merges_consecutive_roles_in_order() {
        let contents = vec![
            Content::user("Hello"),
            Content::user("How are you?"),
            Content::from_text("Fine", "assistant"),
        ];
        let messages = contents_to_messages(&contents).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0].content,
            vec![
                ContentBlockParam::text("Hello"),
                ContentBlockParam::text("How are you?")
            ]
        );
    }

    #[test]
    fn test_alternation_holds_for_mixed_histories() {
        let contents = vec![
            Content::model("a"),
            Content::model("b"),
            Content::new(ROLE_USER, vec![]),
            Content::new(ROLE_MODEL, vec![Part::function_call("c1", "f", Map::new())]),
            Content::new(ROLE_MODEL, vec![Part::function_response("c1", "f", Map::new())]),
            Content::user("c"),
            Content::new(ROLE_USER, vec![Part::text("")]),
            Content::model("d"),
        ];
        let messages = contents_to_messages(&contents).unwrap();
        for pair in messages.windows(2) {
            assert_ne!(pair[0].role, pair[1].role);
        }
        assert_eq!(
            roles(&messages),
            vec![MessageRole::Assistant, MessageRole::User, MessageRole::Assistant]
        );
    }

    #[test]
    fn test_role_forcing_overrides_declared_role() {
        let contents = vec![
            Content::new("user", vec![Part::function_call("toolu_1", "lookup", Map::new())]),
            Content::new(
                "model",
                vec![Part::function_response("toolu_1", "lookup", args(json!({"ok": true})))],
            ),
        ];
        let messages = contents_to_messages(&contents).unwrap();
        assert_eq!(
            roles(&messages),
            vec![MessageRole::Assistant, MessageRole::User]
        );
    }

    #[test]
    fn test_tool_correlation_round_trip() {
        let contents = vec![
            Content::new(
                ROLE_MODEL,
                vec![Part::function_call("toolu_1", "get_weather", args(json!({"city": "Paris"})))],
            ),
            Content::new(
                ROLE_USER,
                vec![Part::function_response("toolu_1", "get_weather", args(json!({"temp": 21})))],
            ),
        ];
        let messages = contents_to_messages(&contents).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0].content,
            vec![ContentBlockParam::tool_use(
                "toolu_1",
                "get_weather",
                json!({"city": "Paris"})
            )]
        );
        assert_eq!(
            messages[1].content,
            vec![ContentBlockParam::tool_result("toolu_1", r#"{"temp":21}"#)]
        );
    }

    #[test]
    fn test_function_response_id_falls_back_to_name() {
        let part = Part::FunctionResponse(FunctionResponse {
            id: String::new(),
            name: "lookup".to_string(),
            response: None,
        });
        assert_eq!(
            part_to_block(&part).unwrap(),
            Some(ContentBlockParam::tool_result("lookup", ""))
        );
    }

    #[test]
    fn test_function_call_without_args() {
        let part = Part::FunctionCall(FunctionCall {
            id: "toolu_2".to_string(),
            name: "now".to_string(),
            args: None,
        });
        assert_eq!(
            part_to_block(&part).unwrap(),
            Some(ContentBlockParam::tool_use("toolu_2", "now", json!({})))
        );
    }

    #[test]
    fn test_thought_parts() {
        let signed = Part::thought("step one", Some(vec![1, 2, 3]));
        assert_eq!(
            part_to_block(&signed).unwrap(),
            Some(ContentBlockParam::Thinking {
                thinking: "step one".to_string(),
                signature: "AQID".to_string(),
            })
        );

        let unsigned = Part::thought("step two", Some(vec![]));
        assert_eq!(
            part_to_block(&unsigned).unwrap(),
            Some(ContentBlockParam::text("step two"))
        );
    }

    #[test]
    fn test_inline_media() {
        let png = Part::inline_data("IMAGE/PNG", vec![0u8, 1, 2]);
        assert_eq!(
            part_to_block(&png).unwrap(),
            Some(ContentBlockParam::Image {
                source: ImageSource::Base64 {
                    media_type: ImageMediaType::Png,
                    data: "AAEC".to_string(),
                }
            })
        );

        let pdf = Part::inline_data("application/pdf", b"%PDF".to_vec());
        assert!(matches!(
            part_to_block(&pdf).unwrap(),
            Some(ContentBlockParam::Document {
                source: DocumentSource::Base64 { .. }
            })
        ));

        let tiff = Part::inline_data("image/tiff", vec![0u8]);
        assert!(matches!(
            part_to_block(&tiff),
            Err(ParleyError::UnsupportedMediaType(m)) if m == "image/tiff"
        ));

        let audio = Part::inline_data("audio/wav", vec![0u8]);
        assert!(matches!(
            part_to_block(&audio),
            Err(ParleyError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_file_media() {
        let image = Part::file_data("image/jpeg", "https://example.com/cat.jpg");
        assert_eq!(
            part_to_block(&image).unwrap(),
            Some(ContentBlockParam::Image {
                source: ImageSource::Url {
                    url: "https://example.com/cat.jpg".to_string()
                }
            })
        );

        let pdf = Part::file_data("application/pdf", "https://example.com/paper.pdf");
        assert!(matches!(
            part_to_block(&pdf).unwrap(),
            Some(ContentBlockParam::Document {
                source: DocumentSource::Url { .. }
            })
        ));

        let video = Part::file_data("video/mp4", "gs://bucket/clip.mp4");
        assert!(part_to_block(&video).is_err());
    }

    #[test]
    fn test_unsupported_role_reports_turn() {
        let contents = vec![Content::user("hi"), Content::from_text("x", "tool")];
        let err = contents_to_messages(&contents).unwrap_err();

        assert!(matches!(err, ParleyError::Conversion { turn: 1, part: None, .. }));
        assert!(matches!(err.root_cause(), ParleyError::UnsupportedRole(r) if r == "tool"));
    }

    #[test]
    fn test_unsupported_part_reports_turn_and_part() {
        let contents = vec![Content::new(
            ROLE_MODEL,
            vec![
                Part::text("running"),
                Part::ExecutableCode(ExecutableCode {
                    language: "PYTHON".to_string(),
                    code: "print(1)".to_string(),
                }),
            ],
        )];
        let err = contents_to_messages(&contents).unwrap_err();

        assert!(matches!(
            err,
            ParleyError::Conversion {
                turn: 0,
                part: Some(1),
                ..
            }
        ));
        assert!(matches!(
            err.root_cause(),
            ParleyError::UnsupportedPartType(_)
        ));
    }

    #[test]
    fn test_system_instruction() {
        assert!(system_instruction_to_system(None).is_empty());

        let instruction = Content::new(
            "system",
            vec![
                Part::text("You are a helpful assistant."),
                Part::text(""),
                Part::text("Be concise."),
            ],
        );
        assert_eq!(system_instruction_to_system(Some(&instruction)).len(), 2);
    }

    #[test]
    fn test_ensure_user_terminated() {
        let mut empty = Vec::new();
        assert!(ensure_user_terminated(&mut empty));
        assert_eq!(empty, vec![Content::user(EMPTY_HISTORY_PROMPT)]);

        let mut ends_on_model = vec![Content::user("hi"), Content::model("hello")];
        assert!(ensure_user_terminated(&mut ends_on_model));
        assert_eq!(ends_on_model.len(), 3);
        assert_eq!(ends_on_model[2], Content::user(CONTINUE_PROMPT));

        let mut ends_on_user = vec![Content::user("hi")];
        assert!(!ensure_user_terminated(&mut ends_on_user));
        assert_eq!(ends_on_user.len(), 1);

        let mut ends_on_tool_result = vec![Content::new(
            "tool",
            vec![Part::function_response("toolu_1", "f", Map::new())],
        )];
        assert!(!ensure_user_terminated(&mut ends_on_tool_result));

        let mut ends_on_call = vec![Content::new(
            ROLE_USER,
            vec![Part::function_call("toolu_1", "f", Map::new())],
        )];
        assert!(ensure_user_terminated(&mut ends_on_call));

        let mut ends_on_empty_user = vec![
            Content::model("x"),
            Content::user(""),
            Content::new(ROLE_USER, Vec::new()),
        ];
        assert!(ensure_user_terminated(&mut ends_on_empty_user));
        assert_eq!(ends_on_empty_user[3], Content::user(CONTINUE_PROMPT));
        let messages = contents_to_messages(&ends_on_empty_user).unwrap();
        assert_eq!(
            roles(&messages),
            vec![MessageRole::Assistant, MessageRole::User]
        );

        let mut only_empty = vec![Content::user("")];
        assert!(ensure_user_terminated(&mut only_empty));
        assert_eq!(only_empty[1], Content::user(EMPTY_HISTORY_PROMPT));
    }

    #[test]
    fn test_build_message_request() {
        let req = LlmRequest::new(vec![Content::user("Weather?")]).with_config(GenerateContentConfig {
            system_instruction: Some(Content::from_text("Be terse.", "system")),
            temperature: Some(0.5),
            top_p: Some(0.25),
            top_k: Some(40),
            stop_sequences: vec!["END".to_string()],
            max_output_tokens: 0,
            tools: vec![Tool::new(vec![FunctionDeclaration::new("get_weather", "Weather")])],
        });

        let params = build_message_request("claude-sonnet-4-20250514", 4096, &req).unwrap();
        assert_eq!(params.max_tokens, 4096);
        assert_eq!(params.temperature, Some(0.5));
        assert_eq!(params.top_p, Some(0.25));
        assert_eq!(params.top_k, Some(40));
        assert_eq!(params.stop_sequences, vec!["END".to_string()]);
        assert_eq!(params.system.len(), 1);
        assert_eq!(params.tools.len(), 1);
        assert_eq!(params.stream, None);

        let req = req.with_config(GenerateContentConfig::default().with_max_output_tokens(256));
        let params = build_message_request("claude-sonnet-4-20250514", 4096, &req).unwrap();
        assert_eq!(params.max_tokens, 256);
        assert!(params.system.is_empty());
    }
}
