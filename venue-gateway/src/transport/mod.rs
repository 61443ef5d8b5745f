//! Outbound inference transport.
//!
//! This module defines the `InferenceTransport` trait that abstracts the hosted
//! multimodal model behind a single text-generation call, and the closed set of
//! errors the gateway knows how to classify.

mod credentials;
mod gemini;

pub use credentials::CredentialStore;
pub use gemini::GeminiTransport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Base64-encoded image attached to a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload, without any `data:` URL prefix.
    pub data: String,
}

impl InlineImage {
    pub fn jpeg(data: impl Into<String>) -> Self {
        Self {
            mime_type: "image/jpeg".to_string(),
            data: data.into(),
        }
    }
}

/// A single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub image: Option<InlineImage>,
    /// When set, the service is asked for JSON matching this schema.
    pub response_schema: Option<serde_json::Value>,
}

impl GenerationRequest {
    pub fn text(model: &str, prompt: impl Into<String>) -> Self {
        Self {
            model: model.to_string(),
            prompt: prompt.into(),
            image: None,
            response_schema: None,
        }
    }

    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Errors surfaced by a transport, already classified.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("No API key configured")]
    MissingCredential,

    #[error("Credential rejected: {0}")]
    CredentialRejected(String),

    #[error("Service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Communication error: {0}")]
    Communication(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A hosted model reachable by prompt (and optionally image) returning text.
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// Identifier used in logs (e.g., "gemini").
    fn name(&self) -> &'static str;

    /// Issue one generation call and return the response text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, TransportError>;
}
