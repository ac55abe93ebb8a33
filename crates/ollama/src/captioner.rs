//! [`CaptionGenerator`] backed by an Ollama vision model.

use std::path::Path;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use mediaset_core::captioning::{CaptionError, CaptionGenerator};

use crate::api::{OllamaApi, OllamaApiError};
use crate::config::CaptionConfig;

/// Instruction sent with every image.
pub const CAPTION_PROMPT: &str = "Create a very detailed description of this scene. \
Do not use numbered lists or line breaks. IMPORTANT: The description should \
1) describe the main content of the scene, \
2) describe the environment and lighting details, \
3) identify the type of shot (e.g., aerial shot, close-up, medium shot, long shot, \
view from below, view from above, POV, full body), and \
4) include the atmosphere of the scene (e.g., cozy, tense, mysterious). \
Here's a template you MUST use: '{Primary Subject Action/Description}. \
{Environment and Lighting Details}. {Style and Technical Specifications}'";

pub struct OllamaCaptioner {
    api: OllamaApi,
}

impl OllamaCaptioner {
    pub fn new(config: &CaptionConfig) -> Result<Self, CaptionError> {
        let api = OllamaApi::new(config).map_err(upstream)?;
        Ok(Self { api })
    }
}

#[async_trait]
impl CaptionGenerator for OllamaCaptioner {
    async fn generate(&self, media_path: &Path) -> Result<String, CaptionError> {
        let bytes = tokio::fs::read(media_path).await?;
        tracing::debug!(
            path = %media_path.display(),
            bytes = bytes.len(),
            model = self.api.model(),
            "Requesting caption"
        );
        let image = STANDARD.encode(&bytes);
        self.api
            .generate(CAPTION_PROMPT, vec![image])
            .await
            .map_err(upstream)
    }
}

fn upstream(err: OllamaApiError) -> CaptionError {
    CaptionError::Upstream(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use assert_matches::assert_matches;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    type Seen = Arc<Mutex<Option<Value>>>;

    /// Serve `/api/generate` on an ephemeral port, answering every request
    /// with `status`/`body` after `delay`. Returns the base URL and the last
    /// request body received.
    async fn mock_ollama(status: StatusCode, body: &'static str, delay: Duration) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let recorder = Arc::clone(&seen);
        let app = Router::new().route(
            "/api/generate",
            post(move |Json(request): Json<Value>| {
                let recorder = Arc::clone(&recorder);
                async move {
                    *recorder.lock().unwrap() = Some(request);
                    tokio::time::sleep(delay).await;
                    (status, body)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    fn config(base_url: String, timeout: Duration) -> CaptionConfig {
        CaptionConfig {
            base_url,
            model: "llava".into(),
            timeout,
        }
    }

    fn image_file() -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"\x89PNG fake").unwrap();
        file
    }

    #[tokio::test]
    async fn sends_base64_image_and_returns_trimmed_text() {
        let (url, seen) = mock_ollama(
            StatusCode::OK,
            r#"{"response":"  A red fox crosses a snowy field. Overcast light.  ","done":true}"#,
            Duration::ZERO,
        )
        .await;
        let captioner = OllamaCaptioner::new(&config(url, Duration::from_secs(5))).unwrap();
        let image = image_file();

        let caption = captioner.generate(image.path()).await.unwrap();

        assert_eq!(caption, "A red fox crosses a snowy field. Overcast light.");
        let request = seen.lock().unwrap().clone().unwrap();
        assert_eq!(request["model"], "llava");
        assert_eq!(request["stream"], false);
        assert_eq!(request["prompt"], CAPTION_PROMPT);
        assert_eq!(request["images"][0], STANDARD.encode(b"\x89PNG fake"));
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let (url, _) = mock_ollama(
            StatusCode::INTERNAL_SERVER_ERROR,
            "model not loaded",
            Duration::ZERO,
        )
        .await;
        let captioner = OllamaCaptioner::new(&config(url, Duration::from_secs(5))).unwrap();
        let image = image_file();

        let err = captioner.generate(image.path()).await.unwrap_err();
        assert_matches!(err, CaptionError::Upstream(msg) if msg.contains("500"));
    }

    #[tokio::test]
    async fn malformed_body_is_upstream_error() {
        let (url, _) = mock_ollama(StatusCode::OK, "not json", Duration::ZERO).await;
        let captioner = OllamaCaptioner::new(&config(url, Duration::from_secs(5))).unwrap();
        let image = image_file();

        assert_matches!(
            captioner.generate(image.path()).await,
            Err(CaptionError::Upstream(_))
        );
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let (url, _) = mock_ollama(
            StatusCode::OK,
            r#"{"response":"late"}"#,
            Duration::from_secs(5),
        )
        .await;
        let captioner = OllamaCaptioner::new(&config(url, Duration::from_millis(200))).unwrap();
        let image = image_file();

        assert_matches!(
            captioner.generate(image.path()).await,
            Err(CaptionError::Upstream(_))
        );
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let captioner = OllamaCaptioner::new(&config(
            "http://127.0.0.1:9".into(),
            Duration::from_secs(1),
        ))
        .unwrap();

        assert_matches!(
            captioner
                .generate(Path::new("/definitely/not/here.png"))
                .await,
            Err(CaptionError::Io(_))
        );
    }
}
