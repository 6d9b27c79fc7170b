//! Translators between the neutral conversation model and the Messages API.
//!
//! - [`request`]: turns and generation config to a request envelope
//! - [`tools`]: function declarations to tool definitions
//! - [`response`]: a complete message to a neutral response

pub mod request;
pub mod response;
pub mod tools;

pub use request::{build_message_request, contents_to_messages, ensure_user_terminated};
pub use response::message_to_response;
pub use tools::tools_to_params;
