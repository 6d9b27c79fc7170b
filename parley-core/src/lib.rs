//! # Parley Core
//!
//! Provider-neutral conversation model and abstractions.
//!
//! This crate defines the turn/part content model, generation requests and
//! responses, tool declarations, the [`Model`] trait providers implement, and
//! the [`Layer`] traits used to compose cross-cutting behavior around a model.

pub mod error;
pub mod layer;
pub mod model;
pub mod schema;
pub mod types;

// Re-exports
pub use error::ParleyError;
pub use layer::{Layer, LayeredModel};
pub use model::{collect_final_response, Model, ResponseStream};
pub use schema::*;
pub use types::*;

/// Result type alias for Parley operations
pub type Result<T> = std::result::Result<T, ParleyError>;
