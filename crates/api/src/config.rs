use std::path::PathBuf;

use mediaset_ollama::CaptionConfig;

/// Default multipart body limit (512 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields except captioning have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`; uploads and bundles can be slow).
    pub request_timeout_secs: u64,
    /// Static web root served for paths not matched by the API.
    pub public_dir: PathBuf,
    /// Directory holding one subdirectory per dataset.
    pub datasets_root: PathBuf,
    /// Where multipart uploads are spooled before they are moved into a dataset.
    pub upload_staging_dir: PathBuf,
    /// Maximum accepted request body for uploads.
    pub max_upload_bytes: usize,
    /// Captioning model connection; `None` disables caption generation.
    pub caption: Option<CaptionConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                      |
    /// | `PUBLIC_DIR`           | `public`                   |
    /// | `DATASETS_ROOT`        | `{PUBLIC_DIR}/datasets`    |
    /// | `UPLOAD_STAGING_DIR`   | `storage/uploads`          |
    /// | `MAX_UPLOAD_BYTES`     | `536870912`                |
    ///
    /// Captioning variables are documented on [`CaptionConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let public_dir = PathBuf::from(std::env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".into()));

        let datasets_root = std::env::var("DATASETS_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| public_dir.join("datasets"));

        let upload_staging_dir = PathBuf::from(
            std::env::var("UPLOAD_STAGING_DIR").unwrap_or_else(|_| "storage/uploads".into()),
        );

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .map(|v| v.parse().expect("MAX_UPLOAD_BYTES must be a valid usize"))
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let caption = CaptionConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            public_dir,
            datasets_root,
            upload_staging_dir,
            max_upload_bytes,
            caption,
        }
    }
}
