//! REST client for the Ollama `/api/generate` endpoint.

use serde::{Deserialize, Serialize};

use crate::config::CaptionConfig;

/// HTTP client bound to one Ollama server and model.
pub struct OllamaApi {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

/// Request body for `POST /api/generate` (non-streaming).
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    /// Base64-encoded images attached to the prompt.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// The part of the `/api/generate` response we use.
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

/// Errors from the Ollama REST layer.
#[derive(Debug, thiserror::Error)]
pub enum OllamaApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Ollama returned a non-2xx status code.
    #[error("Ollama API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The body was not the expected JSON document.
    #[error("Malformed Ollama response: {0}")]
    MalformedResponse(String),
}

impl OllamaApi {
    /// Build a client with the configured request timeout.
    pub fn new(config: &CaptionConfig) -> Result<Self, OllamaApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &CaptionConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one non-streaming generation and return the trimmed response text.
    pub async fn generate(
        &self,
        prompt: &str,
        images: Vec<String>,
    ) -> Result<String, OllamaApiError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            images,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let text = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| OllamaApiError::MalformedResponse(e.to_string()))?;
        Ok(parsed.response.trim().to_string())
    }

    /// Return the response unchanged on a 2xx status, or an
    /// [`OllamaApiError::ApiError`] carrying the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, OllamaApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(OllamaApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}
