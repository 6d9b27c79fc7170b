//! # Parley Layers
//!
//! Built-in layers for Parley models.
//!
//! Currently implemented layers:
//! - `LoggingLayer`: Logs model calls with outcome, token usage and timing
//!
//! ## Usage
//!
//! ```ignore
//! use parley_core::Layer;
//! use parley_layer::LoggingLayer;
//!
//! let model = LoggingLayer::new().layer(anthropic_model);
//! ```

pub mod logging;

// Re-exports
pub use logging::{LoggingLayer, LoggingModel};
