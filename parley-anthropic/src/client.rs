//! The transport seam.
//!
//! Sending requests (HTTP, auth, retries) is not this crate's job. A
//! [`MessagesClient`] is handed complete request bodies and returns complete
//! messages or a stream of events; [`AnthropicModel`](crate::AnthropicModel)
//! does all translation around it.

use crate::wire::{Message, MessageRequest, StreamEvent};
use async_trait::async_trait;
use futures::Stream;
use parley_core::error::ParleyError;
use std::fmt::Debug;

/// Stream of wire events from one streaming call
pub type EventStream = dyn Stream<Item = Result<StreamEvent, ParleyError>> + Send + Unpin;

/// A client for the Messages API.
///
/// Implementations must be safe to share between concurrent calls.
#[async_trait]
pub trait MessagesClient: Send + Sync + Debug + 'static {
    /// Send a request and wait for the complete message
    async fn create_message(&self, req: MessageRequest) -> Result<Message, ParleyError>;

    /// Send a request with `stream` set and return its events
    async fn stream_message(&self, req: MessageRequest) -> Result<Box<EventStream>, ParleyError>;
}
