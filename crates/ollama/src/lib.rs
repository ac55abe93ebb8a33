//! Caption generation through an Ollama-compatible `/api/generate` endpoint.
//!
//! [`api::OllamaApi`] is the thin REST wrapper; [`captioner::OllamaCaptioner`]
//! implements the core [`mediaset_core::captioning::CaptionGenerator`] trait
//! on top of it.

pub mod api;
pub mod captioner;
pub mod config;

pub use captioner::OllamaCaptioner;
pub use config::CaptionConfig;
