//! Layer trait and abstractions.
//!
//! Layers wrap a model with cross-cutting concerns such as logging while
//! keeping the [`Model`] interface intact.

use crate::error::ParleyError;
use crate::model::{Model, ResponseStream};
use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;

/// Layer trait for wrapping models.
///
/// Each layer wraps an inner model and returns a new model with enhanced
/// behavior.
pub trait Layer<M: Model> {
    /// The type of the layered model
    type LayeredModel: Model;

    /// Wrap the inner model with this layer
    fn layer(&self, inner: M) -> Self::LayeredModel;
}

/// Helper trait for layered models.
///
/// Provides forwarding implementations for the model methods. Implementers
/// only override the methods they want to intercept.
#[async_trait]
pub trait LayeredModel: Sized + Model {
    /// The inner model type
    type Inner: Model;

    /// Get a reference to the inner model
    fn inner(&self) -> &Self::Inner;

    /// Default implementation for info - forwards to inner
    fn layered_info(&self) -> Arc<ModelInfo> {
        self.inner().info()
    }

    /// Default implementation for generate_content - forwards to inner
    async fn layered_generate_content(&self, req: LlmRequest) -> Result<LlmResponse, ParleyError> {
        self.inner().generate_content(req).await
    }

    /// Default implementation for stream_generate_content - forwards to inner
    async fn layered_stream_generate_content(
        &self,
        req: LlmRequest,
    ) -> Result<Box<ResponseStream>, ParleyError> {
        self.inner().stream_generate_content(req).await
    }
}
