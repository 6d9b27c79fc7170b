//! Model trait and core abstractions.

use crate::error::ParleyError;
use crate::types::*;
use async_trait::async_trait;
use futures::Stream;
use std::fmt::Debug;
use std::sync::Arc;

/// Stream type alias for neutral responses.
///
/// A response stream yields zero or more partial responses followed by exactly
/// one response with `turn_complete` set, or ends early with an error.
pub type ResponseStream = dyn Stream<Item = Result<LlmResponse, ParleyError>> + Send + Unpin;

/// Core model trait.
///
/// A model accepts provider-neutral requests and produces provider-neutral
/// responses. Implementations own the translation to and from their wire
/// format; sequencing, retries and tool execution belong to the caller.
#[async_trait]
pub trait Model: Send + Sync + Debug + 'static {
    /// Get model information
    fn info(&self) -> Arc<ModelInfo>;

    /// Generate a complete response (non-streaming)
    async fn generate_content(&self, req: LlmRequest) -> Result<LlmResponse, ParleyError>;

    /// Stream a response as partial updates followed by one final response
    async fn stream_generate_content(
        &self,
        req: LlmRequest,
    ) -> Result<Box<ResponseStream>, ParleyError>;
}

/// Helper function to drain a response stream into its final response.
///
/// Partial responses are discarded; the turn-complete response is returned.
pub async fn collect_final_response(
    mut stream: Box<ResponseStream>,
) -> Result<LlmResponse, ParleyError> {
    use futures::StreamExt;

    let mut partials = 0usize;
    while let Some(resp) = stream.next().await {
        let resp = resp?;
        if resp.turn_complete {
            tracing::trace!("collected final response after {} partials", partials);
            return Ok(resp);
        }
        partials += 1;
    }

    Err(ParleyError::stream_transport(
        "stream ended without a final response",
    ))
}
