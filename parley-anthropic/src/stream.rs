//! Streaming accumulator.
//!
//! [`StreamAccumulator`] turns a stream of wire events into neutral responses:
//! a partial response for every text or thinking delta as it arrives, then one
//! turn-complete response built from the fully accumulated message once the
//! event source is exhausted. Failures end the stream; partials already
//! yielded stay valid.

use crate::convert::response::{
    message_to_response, partial_text_response, partial_thought_response,
};
use crate::wire::*;
use futures::stream::{FusedStream, Stream};
use parley_core::error::ParleyError;
use parley_core::types::LlmResponse;
use pin_project::pin_project;
use serde_json::Value;
use std::collections::HashMap;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Folds stream events into a complete [`Message`]
#[derive(Debug, Default)]
pub struct MessageAccumulator {
    message: Message,
    /// Tool input JSON fragments per block index, parsed at block stop
    partial_json: HashMap<usize, String>,
}

impl MessageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The message accumulated so far
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Finish accumulation, parsing any tool input left unterminated
    pub fn into_message(mut self) -> Message {
        let pending: Vec<usize> = self.partial_json.keys().copied().collect();
        for index in pending {
            self.finish_block(index);
        }
        self.message
    }

    /// Fold one event into the message.
    ///
    /// Fails when a delta addresses a block that does not exist or does not
    /// fit the block's kind, and on an in-band `error` event.
    pub fn fold(&mut self, event: &StreamEvent) -> Result<(), ParleyError> {
        match event {
            StreamEvent::MessageStart { message } => {
                self.message = message.clone();
                self.partial_json.clear();
            }
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => {
                let expected = self.message.content.len();
                if *index != expected {
                    return Err(ParleyError::stream_accumulation(format!(
                        "content block {} started out of order (expected {})",
                        index, expected
                    )));
                }
                self.message.content.push(content_block.clone());
            }
            StreamEvent::ContentBlockDelta { index, delta } => self.apply_delta(*index, delta)?,
            StreamEvent::ContentBlockStop { index } => {
                if *index >= self.message.content.len() {
                    return Err(ParleyError::stream_accumulation(format!(
                        "stop for unknown content block {}",
                        index
                    )));
                }
                self.finish_block(*index);
            }
            StreamEvent::MessageDelta { delta, usage } => {
                self.message.stop_reason = delta.stop_reason.or(self.message.stop_reason);
                if delta.stop_sequence.is_some() {
                    self.message.stop_sequence = delta.stop_sequence.clone();
                }

                let acc = &mut self.message.usage;
                acc.output_tokens = usage.output_tokens;
                if let Some(n) = usage.input_tokens {
                    acc.input_tokens = n;
                }
                if usage.cache_creation_input_tokens.is_some() {
                    acc.cache_creation_input_tokens = usage.cache_creation_input_tokens;
                }
                if usage.cache_read_input_tokens.is_some() {
                    acc.cache_read_input_tokens = usage.cache_read_input_tokens;
                }
            }
            StreamEvent::Error { error } => {
                return Err(ParleyError::stream_transport(format!(
                    "{}: {}",
                    error.kind, error.message
                )));
            }
            StreamEvent::MessageStop | StreamEvent::Ping => {}
            StreamEvent::Unknown => tracing::trace!("ignoring unknown stream event"),
        }
        Ok(())
    }

    fn apply_delta(&mut self, index: usize, delta: &ContentDelta) -> Result<(), ParleyError> {
        let block = self.message.content.get_mut(index).ok_or_else(|| {
            ParleyError::stream_accumulation(format!("delta for unknown content block {}", index))
        })?;

        match (block, delta) {
            (ContentBlock::Text { text, .. }, ContentDelta::TextDelta { text: more }) => {
                text.push_str(more);
            }
            (ContentBlock::Text { citations, .. }, ContentDelta::CitationsDelta { citation }) => {
                citations.get_or_insert_with(Vec::new).push(citation.clone());
            }
            (
                ContentBlock::Thinking { thinking, .. },
                ContentDelta::ThinkingDelta { thinking: more },
            ) => thinking.push_str(more),
            (
                ContentBlock::Thinking { signature, .. },
                ContentDelta::SignatureDelta { signature: more },
            ) => signature.push_str(more),
            (
                ContentBlock::ToolUse { .. } | ContentBlock::ServerToolUse { .. },
                ContentDelta::InputJsonDelta { partial_json },
            ) => self
                .partial_json
                .entry(index)
                .or_default()
                .push_str(partial_json),
            (_, ContentDelta::Unknown) => tracing::trace!(index, "ignoring unknown delta"),
            (block, delta) => {
                return Err(ParleyError::stream_accumulation(format!(
                    "delta {:?} does not apply to content block {} ({})",
                    delta,
                    index,
                    block_kind(block)
                )));
            }
        }
        Ok(())
    }

    fn finish_block(&mut self, index: usize) {
        let Some(json) = self.partial_json.remove(&index) else {
            return;
        };
        let Some(
            ContentBlock::ToolUse { input, name, .. }
            | ContentBlock::ServerToolUse { input, name, .. },
        ) = self.message.content.get_mut(index)
        else {
            return;
        };
        if json.trim().is_empty() {
            return;
        }

        *input = serde_json::from_str(&json).unwrap_or_else(|e| {
            tracing::debug!(tool = %name, error = %e, "tool input JSON did not parse");
            Value::Null
        });
    }
}

fn block_kind(block: &ContentBlock) -> &'static str {
    match block {
        ContentBlock::Text { .. } => "text",
        ContentBlock::Thinking { .. } => "thinking",
        ContentBlock::RedactedThinking { .. } => "redacted_thinking",
        ContentBlock::ToolUse { .. } => "tool_use",
        ContentBlock::ServerToolUse { .. } => "server_tool_use",
        ContentBlock::WebSearchToolResult { .. } => "web_search_tool_result",
        ContentBlock::Unknown => "unknown",
    }
}

/// Lifecycle of a [`StreamAccumulator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Events are still arriving
    Open,
    /// The event source is exhausted; the final response is next
    Draining,
    /// The final response was emitted or the stream failed
    Closed,
}

/// Adapts a wire event stream into a neutral response stream.
///
/// Dropping the accumulator releases the event source without producing the
/// final response.
#[pin_project]
#[derive(Debug)]
pub struct StreamAccumulator<S> {
    #[pin]
    events: S,
    accumulator: Option<MessageAccumulator>,
    state: StreamState,
}

impl<S> StreamAccumulator<S>
where
    S: Stream<Item = Result<StreamEvent, ParleyError>>,
{
    pub fn new(events: S) -> Self {
        Self {
            events,
            accumulator: Some(MessageAccumulator::new()),
            state: StreamState::Open,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }
}

impl<S> Stream for StreamAccumulator<S>
where
    S: Stream<Item = Result<StreamEvent, ParleyError>>,
{
    type Item = Result<LlmResponse, ParleyError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            match *this.state {
                StreamState::Closed => return Poll::Ready(None),
                StreamState::Draining => {
                    *this.state = StreamState::Closed;
                    let message = this
                        .accumulator
                        .take()
                        .map(MessageAccumulator::into_message);
                    let mut resp = message_to_response(message.as_ref());
                    resp.turn_complete = true;
                    return Poll::Ready(Some(Ok(resp)));
                }
                StreamState::Open => {}
            }

            let event = match ready!(this.events.as_mut().poll_next(cx)) {
                None => {
                    *this.state = StreamState::Draining;
                    continue;
                }
                Some(Err(err)) => {
                    *this.state = StreamState::Closed;
                    return Poll::Ready(Some(Err(as_transport_error(err))));
                }
                Some(Ok(event)) => event,
            };

            tracing::trace!(event = event.kind(), "stream event");

            if let Some(acc) = this.accumulator.as_mut() {
                if let Err(err) = acc.fold(&event) {
                    *this.state = StreamState::Closed;
                    return Poll::Ready(Some(Err(err)));
                }
            }

            if let StreamEvent::ContentBlockDelta { delta, .. } = &event {
                match delta {
                    ContentDelta::TextDelta { text } => {
                        return Poll::Ready(Some(Ok(partial_text_response(text.clone()))));
                    }
                    ContentDelta::ThinkingDelta { thinking } => {
                        return Poll::Ready(Some(Ok(partial_thought_response(thinking.clone()))));
                    }
                    _ => {}
                }
            }
        }
    }
}

impl<S> FusedStream for StreamAccumulator<S>
where
    S: Stream<Item = Result<StreamEvent, ParleyError>>,
{
    fn is_terminated(&self) -> bool {
        self.state == StreamState::Closed
    }
}

fn as_transport_error(err: ParleyError) -> ParleyError {
    match err {
        ParleyError::StreamTransport(_) => err,
        other => ParleyError::stream_transport(other.to_string()),
    }
}
