//! Backend configuration for Anthropic models.

use parley_core::error::ParleyError;
use std::env;

/// Default `max_tokens` sent when the request does not set one
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Environment variable holding the direct API key
pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";

/// Environment variable selecting the Vertex AI backend
pub const ENV_USE_VERTEX: &str = "ANTHROPIC_USE_VERTEX";

/// Environment variable holding the Google Cloud project
pub const ENV_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";

/// Environment variable holding the Google Cloud region
pub const ENV_REGION: &str = "GOOGLE_CLOUD_REGION";

/// Which backend serves the Messages API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Variant {
    /// The direct Anthropic API
    #[default]
    AnthropicApi,
    /// Anthropic models hosted on Google Cloud Vertex AI
    VertexAi,
}

impl Variant {
    /// Resolve the variant from `ANTHROPIC_USE_VERTEX`.
    ///
    /// `1` or `true` (case-insensitive, surrounding whitespace ignored) select
    /// Vertex AI; anything else selects the direct API.
    pub fn from_env() -> Self {
        Self::from_flag(env::var(ENV_USE_VERTEX).ok().as_deref())
    }

    fn from_flag(flag: Option<&str>) -> Self {
        match flag.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("1") | Some("true") | Some("t") => Variant::VertexAi,
            _ => Variant::AnthropicApi,
        }
    }
}

/// Unresolved configuration; empty fields fall back to the environment
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub vertex_project_id: Option<String>,
    pub vertex_region: Option<String>,
    pub variant: Option<Variant>,
    pub default_max_tokens: Option<u32>,
}

/// Credentials for the selected backend
#[derive(Clone, PartialEq, Eq)]
pub enum Backend {
    AnthropicApi { api_key: Option<String> },
    VertexAi { project_id: String, region: String },
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::AnthropicApi { api_key } => f
                .debug_struct("AnthropicApi")
                .field("api_key", &api_key.as_ref().map(|_| "<redacted>"))
                .finish(),
            Backend::VertexAi { project_id, region } => f
                .debug_struct("VertexAi")
                .field("project_id", project_id)
                .field("region", region)
                .finish(),
        }
    }
}

/// Configuration after environment fallbacks and validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub backend: Backend,
    pub default_max_tokens: u32,
}

impl ResolvedConfig {
    pub fn variant(&self) -> Variant {
        match self.backend {
            Backend::AnthropicApi { .. } => Variant::AnthropicApi,
            Backend::VertexAi { .. } => Variant::VertexAi,
        }
    }
}

impl Config {
    /// Apply environment fallbacks and validate the result
    pub fn resolve(self) -> Result<ResolvedConfig, ParleyError> {
        self.resolve_with(|key| env::var(key).ok())
    }

    fn resolve_with(
        self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ResolvedConfig, ParleyError> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let variant = self
            .variant
            .unwrap_or_else(|| Variant::from_flag(lookup(ENV_USE_VERTEX).as_deref()));

        let backend = match variant {
            Variant::VertexAi => {
                let project_id = non_empty(self.vertex_project_id)
                    .or_else(|| non_empty(lookup(ENV_PROJECT)))
                    .ok_or_else(|| {
                        ParleyError::configuration(format!(
                            "Vertex AI project is required (set {})",
                            ENV_PROJECT
                        ))
                    })?;
                let region = non_empty(self.vertex_region)
                    .or_else(|| non_empty(lookup(ENV_REGION)))
                    .ok_or_else(|| {
                        ParleyError::configuration(format!(
                            "Vertex AI region is required (set {})",
                            ENV_REGION
                        ))
                    })?;
                Backend::VertexAi { project_id, region }
            }
            Variant::AnthropicApi => Backend::AnthropicApi {
                api_key: non_empty(self.api_key).or_else(|| non_empty(lookup(ENV_API_KEY))),
            },
        };

        let default_max_tokens = self
            .default_max_tokens
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_TOKENS);

        tracing::debug!(?variant, default_max_tokens, "resolved anthropic config");

        Ok(ResolvedConfig {
            backend,
            default_max_tokens,
        })
    }
}
