use std::time::Duration;

use mediaset_core::captioning::CaptionError;

/// Default timeout for one caption request.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for the captioning model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionConfig {
    /// Base URL of the Ollama server, without a trailing slash.
    pub base_url: String,
    /// Model identifier passed in every request (e.g. `llava`).
    pub model: String,
    /// Whole-request timeout; hitting it is an upstream failure.
    pub timeout: Duration,
}

impl CaptionConfig {
    /// Load captioning configuration from environment variables.
    ///
    /// | Env Var            | Required | Default |
    /// |--------------------|----------|---------|
    /// | `LLM_BASE_URL`     | with `LLM_MODEL` | -- |
    /// | `LLM_MODEL`        | with `LLM_BASE_URL` | -- |
    /// | `LLM_TIMEOUT_SECS` | no       | `120`   |
    ///
    /// Returns `None` when neither URL nor model is set.
    ///
    /// # Panics
    ///
    /// Panics if only one of `LLM_BASE_URL` / `LLM_MODEL` is set, or if
    /// `LLM_TIMEOUT_SECS` is not a number.
    pub fn from_env() -> Option<Self> {
        Self::resolve(
            std::env::var("LLM_BASE_URL").ok(),
            std::env::var("LLM_MODEL").ok(),
            std::env::var("LLM_TIMEOUT_SECS").ok(),
        )
        .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Build a configuration from raw values. Blank values count as unset.
    pub fn resolve(
        base_url: Option<String>,
        model: Option<String>,
        timeout_secs: Option<String>,
    ) -> Result<Option<Self>, CaptionError> {
        let base_url = base_url.filter(|s| !s.trim().is_empty());
        let model = model.filter(|s| !s.trim().is_empty());

        let (base_url, model) = match (base_url, model) {
            (None, None) => return Ok(None),
            (Some(url), Some(model)) => (url, model),
            (Some(_), None) => {
                return Err(CaptionError::Configuration(
                    "LLM_BASE_URL is set but LLM_MODEL is missing".into(),
                ))
            }
            (None, Some(_)) => {
                return Err(CaptionError::Configuration(
                    "LLM_MODEL is set but LLM_BASE_URL is missing".into(),
                ))
            }
        };

        let timeout_secs = match timeout_secs {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                CaptionError::Configuration(format!("LLM_TIMEOUT_SECS must be a number, got '{raw}'"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Some(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            model: model.trim().to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }))
    }
}
