//! # Parley Anthropic
//!
//! Translation between the Parley conversation model and the Anthropic
//! Messages API.
//!
//! - [`convert`]: request, tool schema and response translators
//! - [`stream`]: the streaming accumulator
//! - [`wire`]: Messages API request, response and event types
//! - [`AnthropicModel`]: a [`Model`](parley_core::Model) over any [`MessagesClient`]
//!
//! # Example
//!
//! ```ignore
//! use parley_anthropic::AnthropicModel;
//!
//! let model = AnthropicModel::builder("claude-sonnet-4-20250514")
//!     .client(my_client)
//!     .build()?;
//! ```

pub mod client;
pub mod config;
pub mod convert;
pub mod model;
pub mod stream;
pub mod wire;

// Re-exports
pub use client::{EventStream, MessagesClient};
pub use config::{Backend, Config, ResolvedConfig, Variant, DEFAULT_MAX_TOKENS};
pub use model::{AnthropicBuilder, AnthropicModel};
pub use stream::{MessageAccumulator, StreamAccumulator, StreamState};
