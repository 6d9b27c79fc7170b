//! Anthropic model implementation.
//!
//! [`AnthropicModel`] implements the neutral [`Model`] trait by translating
//! requests to the Messages API, sending them through a [`MessagesClient`],
//! and translating the results back.

use crate::client::MessagesClient;
use crate::config::{Config, ResolvedConfig, Variant};
use crate::convert::{build_message_request, ensure_user_terminated, message_to_response};
use crate::stream::StreamAccumulator;
use crate::wire::MessageRequest;
use async_trait::async_trait;
use parley_core::error::ParleyError;
use parley_core::model::{Model, ResponseStream};
use parley_core::types::*;
use std::sync::Arc;

/// Provider identifier reported in [`ModelInfo`]
pub const PROVIDER_ID: &str = "anthropic";

/// A Claude model served through the Messages API
#[derive(Clone)]
pub struct AnthropicModel {
    client: Arc<dyn MessagesClient>,
    config: ResolvedConfig,
    info: Arc<ModelInfo>,
}

impl std::fmt::Debug for AnthropicModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicModel")
            .field("info", &self.info)
            .field("config", &self.config)
            .finish()
    }
}

impl AnthropicModel {
    /// Create a builder for the named model
    pub fn builder(model: impl Into<String>) -> AnthropicBuilder {
        AnthropicBuilder::new(model)
    }

    /// The resolved backend configuration
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Translate a neutral request into the body sent on the wire.
    ///
    /// A synthetic user turn is appended when the history does not end on one.
    pub fn build_request(&self, req: &LlmRequest) -> Result<MessageRequest, ParleyError> {
        let mut req = req.clone();
        ensure_user_terminated(&mut req.contents);
        build_message_request(&self.info.name, self.config.default_max_tokens, &req)
    }
}

#[async_trait]
impl Model for AnthropicModel {
    fn info(&self) -> Arc<ModelInfo> {
        self.info.clone()
    }

    async fn generate_content(&self, req: LlmRequest) -> Result<LlmResponse, ParleyError> {
        let params = self.build_request(&req)?;
        tracing::debug!(
            model = %params.model,
            messages = params.messages.len(),
            tools = params.tools.len(),
            max_tokens = params.max_tokens,
            "sending message request"
        );

        let message = self.client.create_message(params).await?;
        Ok(message_to_response(Some(&message)))
    }

    async fn stream_generate_content(
        &self,
        req: LlmRequest,
    ) -> Result<Box<ResponseStream>, ParleyError> {
        let mut params = self.build_request(&req)?;
        params.stream = Some(true);
        tracing::debug!(
            model = %params.model,
            messages = params.messages.len(),
            tools = params.tools.len(),
            "opening message stream"
        );

        let events = self.client.stream_message(params).await?;
        Ok(Box::new(StreamAccumulator::new(events)))
    }
}

/// Builder for [`AnthropicModel`]
pub struct AnthropicBuilder {
    model: String,
    config: Config,
    client: Option<Arc<dyn MessagesClient>>,
}

impl AnthropicBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            config: Config::default(),
            client: None,
        }
    }

    /// Set API key (falls back to `ANTHROPIC_API_KEY`)
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    /// Select the backend (falls back to `ANTHROPIC_USE_VERTEX`)
    pub fn variant(mut self, variant: Variant) -> Self {
        self.config.variant = Some(variant);
        self
    }

    /// Set the Vertex AI project (falls back to `GOOGLE_CLOUD_PROJECT`)
    pub fn vertex_project(mut self, project_id: impl Into<String>) -> Self {
        self.config.vertex_project_id = Some(project_id.into());
        self
    }

    /// Set the Vertex AI region (falls back to `GOOGLE_CLOUD_REGION`)
    pub fn vertex_region(mut self, region: impl Into<String>) -> Self {
        self.config.vertex_region = Some(region.into());
        self
    }

    /// Set `max_tokens` for requests that do not set their own
    pub fn default_max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.default_max_tokens = Some(max_tokens);
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the client that sends requests
    pub fn client(mut self, client: Arc<dyn MessagesClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the model
    pub fn build(self) -> Result<AnthropicModel, ParleyError> {
        if self.model.trim().is_empty() {
            return Err(ParleyError::configuration("Model name is required"));
        }
        let client = self
            .client
            .ok_or_else(|| ParleyError::configuration("Messages client is required"))?;
        let config = self.config.resolve()?;

        Ok(AnthropicModel {
            client,
            config,
            info: ModelInfo::new(PROVIDER_ID, self.model),
        })
    }
}
