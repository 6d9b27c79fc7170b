//! Error types for Parley operations.

/// The main error type for translation and model operations.
#[derive(Debug, thiserror::Error)]
pub enum ParleyError {
    /// A neutral role that maps to neither user nor assistant
    #[error("Unsupported role: {0}")]
    UnsupportedRole(String),

    /// An inline or file MIME type with no wire equivalent
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// A part kind the provider cannot represent
    #[error("Unsupported part type: {0}")]
    UnsupportedPartType(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stream event could not be folded into the running message
    #[error("Stream accumulation error: {0}")]
    StreamAccumulation(String),

    /// The underlying event source reported a failure
    #[error("Stream transport error: {0}")]
    StreamTransport(String),

    /// A translation failure with the location of the offending turn and part
    #[error("Failed to convert turn {turn}{}: {source}", part_suffix(.part))]
    Conversion {
        turn: usize,
        part: Option<usize>,
        #[source]
        source: Box<ParleyError>,
    },

    /// Provider client errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ParleyError {
    /// Create an unsupported role error
    pub fn unsupported_role(role: impl Into<String>) -> Self {
        Self::UnsupportedRole(role.into())
    }

    /// Create an unsupported media type error
    pub fn unsupported_media_type(mime_type: impl Into<String>) -> Self {
        Self::UnsupportedMediaType(mime_type.into())
    }

    /// Create an unsupported part type error
    pub fn unsupported_part_type(kind: impl Into<String>) -> Self {
        Self::UnsupportedPartType(kind.into())
    }

    /// Create a stream accumulation error
    pub fn stream_accumulation(msg: impl Into<String>) -> Self {
        Self::StreamAccumulation(msg.into())
    }

    /// Create a stream transport error
    pub fn stream_transport(msg: impl Into<String>) -> Self {
        Self::StreamTransport(msg.into())
    }

    /// Wrap an error with the turn (and optionally part) it came from
    pub fn in_conversion(self, turn: usize, part: Option<usize>) -> Self {
        Self::Conversion {
            turn,
            part,
            source: Box::new(self),
        }
    }

    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// The innermost error, skipping any conversion context
    pub fn root_cause(&self) -> &ParleyError {
        let mut current = self;
        while let ParleyError::Conversion { source, .. } = current {
            current = source;
        }
        current
    }

    /// Whether this error terminated a response stream
    pub fn is_stream_failure(&self) -> bool {
        matches!(
            self.root_cause(),
            ParleyError::StreamAccumulation(_) | ParleyError::StreamTransport(_)
        )
    }
}

fn part_suffix(part: &Option<usize>) -> String {
    part.map(|p| format!(", part {p}")).unwrap_or_default()
}

impl From<String> for ParleyError {
    fn from(s: String) -> Self {
        Self::Provider(s)
    }
}

impl From<&str> for ParleyError {
    fn from(s: &str) -> Self {
        Self::Provider(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_display_and_root_cause() {
        let err = ParleyError::unsupported_media_type("audio/wav").in_conversion(2, Some(1));
        assert_eq!(
            err.to_string(),
            "Failed to convert turn 2, part 1: Unsupported media type: audio/wav"
        );
        assert!(matches!(
            err.root_cause(),
            ParleyError::UnsupportedMediaType(m) if m == "audio/wav"
        ));

        let err = ParleyError::unsupported_role("tool").in_conversion(0, None);
        assert_eq!(err.to_string(), "Failed to convert turn 0: Unsupported role: tool");
    }

    #[test]
    fn test_stream_failure_classification() {
        assert!(ParleyError::stream_transport("reset").is_stream_failure());
        assert!(ParleyError::stream_accumulation("bad index").is_stream_failure());
        assert!(!ParleyError::provider("boom").is_stream_failure());
    }
}
