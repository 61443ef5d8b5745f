//! Gemini `generateContent` transport.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CredentialStore, GenerationRequest, InferenceTransport, TransportError};

/// Gemini REST transport.
///
/// Sends one `generateContent` call per request, authenticating with the key
/// currently held by the shared `CredentialStore`.
pub struct GeminiTransport {
    http_client: Client,
    base_url: String,
    credentials: Arc<CredentialStore>,
}

impl GeminiTransport {
    pub fn new(base_url: &str, credentials: Arc<CredentialStore>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }
}

// ============================================================================
// Gemini API types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<Blob>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

/// Error envelope (`google.rpc.Status`).
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: RpcStatus,
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<RpcDetail>,
}

#[derive(Debug, Deserialize)]
struct RpcDetail {
    #[serde(default)]
    reason: Option<String>,
}

/// Map an HTTP failure onto the transport's closed error set.
///
/// Classification uses the HTTP code, the RPC status name and the error-info
/// reason. Anything unrecognized is a plain service error.
fn classify_failure(http_status: u16, body: &str) -> TransportError {
    let rpc = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
    let message = match &rpc {
        Some(status) if !status.message.is_empty() => status.message.clone(),
        _ if body.trim().is_empty() => format!("HTTP {}", http_status),
        _ => body.trim().to_string(),
    };
    let status_name = rpc.as_ref().and_then(|s| s.status.as_deref()).unwrap_or("");
    let key_invalid = rpc
        .as_ref()
        .map(|s| {
            s.details
                .iter()
                .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
        })
        .unwrap_or(false);

    match (http_status, status_name) {
        (429, _) | (_, "RESOURCE_EXHAUSTED") => TransportError::QuotaExhausted(message),
        (401, _) | (403, _) | (_, "UNAUTHENTICATED") | (_, "PERMISSION_DENIED") => {
            TransportError::CredentialRejected(message)
        }
        (404, _) | (_, "NOT_FOUND") => TransportError::CredentialRejected(message),
        _ if key_invalid => TransportError::CredentialRejected(message),
        _ => TransportError::Service {
            status: http_status,
            message,
        },
    }
}

// ============================================================================
// InferenceTransport implementation
// ============================================================================

#[async_trait]
impl InferenceTransport for GeminiTransport {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, TransportError> {
        let api_key = self
            .credentials
            .get()
            .ok_or(TransportError::MissingCredential)?;

        let mut parts = Vec::with_capacity(2);
        if let Some(image) = &request.image {
            parts.push(Part {
                inline_data: Some(Blob {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                }),
                ..Default::default()
            });
        }
        parts.push(Part {
            text: Some(request.prompt.clone()),
            ..Default::default()
        });

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: request.response_schema.clone().map(|schema| GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
            }),
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );

        tracing::debug!("Sending generateContent request: model={}", request.model);

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Communication(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(text)
    }
}
