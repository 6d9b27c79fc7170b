//! # Parley
//!
//! Provider-neutral conversations over the Anthropic Messages API.
//!
//! Parley translates a neutral conversation model (turns of typed parts,
//! function calls and responses, generation config and tool declarations) to
//! the Messages API wire format and back, including the streaming
//! accumulator that turns server-sent events into partial and final
//! responses.
//!
//! ## Features
//!
//! - **Neutral model**: `Content`/`Part`/`LlmRequest`/`LlmResponse` independent of any provider
//! - **Faithful translation**: role alternation, tool-use correlation and schema mapping
//! - **Streaming**: partial responses as deltas arrive, one turn-complete response at the end
//! - **Composable layers**: wrap any `Model` with logging
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! parley = { version = "0.1", features = ["anthropic", "layers"] }
//! ```
//!
//! ```ignore
//! use parley::prelude::*;
//!
//! # async fn example(client: std::sync::Arc<dyn MessagesClient>) -> Result<()> {
//! let model = LoggingLayer::new().layer(
//!     AnthropicModel::builder("claude-sonnet-4-20250514")
//!         .client(client)
//!         .build()?,
//! );
//!
//! let resp = model
//!     .generate_content(LlmRequest::new(vec![Content::user("What is Rust?")]))
//!     .await?;
//! println!("{}", resp.text());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Includes `anthropic` and `layers`
//! - `anthropic`: Messages API translation and `AnthropicModel`
//! - `layers`: Built-in layers (logging)
//! - `schema`: Generate tool parameter schemas from Rust types with `schemars`
//! - `full`: All features enabled

// Re-export core types and traits
pub use parley_core::*;

// Re-export the Anthropic provider under `anthropic` module
#[cfg(feature = "parley-anthropic")]
pub mod anthropic {
    //! Anthropic Messages API support.
    pub use parley_anthropic::*;
}

// Re-export layers under `layer` module
#[cfg(feature = "parley-layer")]
pub mod layers {
    //! Built-in model layers.
    pub use parley_layer::*;
}

// Re-export schemars when schema feature is enabled
#[cfg(feature = "schema")]
pub mod schemars {
    pub use ::schemars::*;
}

/// Prelude module for convenient imports
pub mod prelude {
    //! Prelude module containing the most commonly used types and traits.
    //!
    //! ```
    //! use parley::prelude::*;
    //! ```

    pub use crate::{
        collect_final_response, Content, FinishReason, FunctionDeclaration,
        GenerateContentConfig, Layer, LlmRequest, LlmResponse, Model, ParleyError, Part, Result,
        Schema, Tool, Type,
    };

    #[cfg(feature = "parley-anthropic")]
    pub use crate::anthropic::{AnthropicModel, MessagesClient, Variant};

    #[cfg(feature = "parley-layer")]
    pub use crate::layers::LoggingLayer;
}
