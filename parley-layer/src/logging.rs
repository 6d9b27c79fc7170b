//! Logging layer for model operations.

use async_trait::async_trait;
use futures::StreamExt;
use parley_core::error::ParleyError;
use parley_core::layer::{Layer, LayeredModel};
use parley_core::model::{Model, ResponseStream};
use parley_core::types::*;
use std::sync::Arc;
use std::time::Instant;

/// Logging layer that logs model operations.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    prefix: String,
}

impl LoggingLayer {
    /// Create a new logging layer
    pub fn new() -> Self {
        Self {
            prefix: "[Parley]".to_string(),
        }
    }

    /// Create a logging layer with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Layer<M> for LoggingLayer {
    type LayeredModel = LoggingModel<M>;

    fn layer(&self, inner: M) -> Self::LayeredModel {
        LoggingModel {
            inner,
            prefix: self.prefix.clone(),
        }
    }
}

/// Model wrapped with logging
#[derive(Debug)]
pub struct LoggingModel<M> {
    inner: M,
    prefix: String,
}

fn total_tokens(resp: &LlmResponse) -> u64 {
    resp.usage_metadata
        .map(|u| u.total_token_count)
        .unwrap_or_default()
}

#[async_trait]
impl<M: Model> LayeredModel for LoggingModel<M> {
    type Inner = M;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_generate_content(&self, req: LlmRequest) -> Result<LlmResponse, ParleyError> {
        let info = self.inner.info();
        tracing::debug!(
            "{} generate_content request: model={}, contents={}",
            self.prefix,
            info.name,
            req.contents.len()
        );

        let start = Instant::now();
        let result = self.inner.generate_content(req).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::debug!(
                    "{} generate_content success: finish_reason={:?}, tokens={}, elapsed={:?}",
                    self.prefix,
                    response.finish_reason,
                    total_tokens(response),
                    elapsed
                );
            }
            Err(e) => {
                tracing::error!(
                    "{} generate_content error: {}, elapsed={:?}",
                    self.prefix,
                    e,
                    elapsed
                );
            }
        }

        result
    }

    async fn layered_stream_generate_content(
        &self,
        req: LlmRequest,
    ) -> Result<Box<ResponseStream>, ParleyError> {
        let info = self.inner.info();
        tracing::debug!(
            "{} stream_generate_content request: model={}, contents={}",
            self.prefix,
            info.name,
            req.contents.len()
        );

        let start = Instant::now();
        let stream = match self.inner.stream_generate_content(req).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(
                    "{} stream_generate_content error: {}, elapsed={:?}",
                    self.prefix,
                    e,
                    start.elapsed()
                );
                return Err(e);
            }
        };

        let prefix = self.prefix.clone();
        let mut partials = 0usize;
        let logged = stream.inspect(move |item| match item {
            Ok(resp) if resp.turn_complete => tracing::debug!(
                "{} stream_generate_content complete: partials={}, finish_reason={:?}, tokens={}, elapsed={:?}",
                prefix,
                partials,
                resp.finish_reason,
                total_tokens(resp),
                start.elapsed()
            ),
            Ok(_) => partials += 1,
            Err(e) => tracing::error!(
                "{} stream_generate_content failed after {} partials: {}, elapsed={:?}",
                prefix,
                partials,
                e,
                start.elapsed()
            ),
        });

        Ok(Box::new(logged))
    }
}

#[async_trait]
impl<M: Model> Model for LoggingModel<M> {
    fn info(&self) -> Arc<ModelInfo> {
        LayeredModel::layered_info(self)
    }

    async fn generate_content(&self, req: LlmRequest) -> Result<LlmResponse, ParleyError> {
        LayeredModel::layered_generate_content(self, req).await
    }

    async fn stream_generate_content(
        &self,
        req: LlmRequest,
    ) -> Result<Box<ResponseStream>, ParleyError> {
        LayeredModel::layered_stream_generate_content(self, req).await
    }
}
