//! Gemini provider implementation.
//!
//! Speaks the `generateContent` REST protocol against either Google AI Studio
//! (API key) or Vertex AI (project, location, bearer token). Single attempt,
//! no retries.

use super::{
    Content, FinishReason, GenerateRequest, GenerationParams, Part, ProviderError,
    ProviderResponse, TextProvider,
};
use crate::config::{GeminiBackend, GeminiSettings};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use service_core::observability::{TracedClientExt, TracedRequest};
use std::time::Duration;

/// AI Studio base URL.
const AI_STUDIO_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub backend: GeminiBackend,
    pub model: String,
    pub api_key: String,
    pub project_id: String,
    pub location: String,
    pub access_token: String,
    pub timeout: Duration,
}

impl From<&GeminiSettings> for GeminiConfig {
    fn from(settings: &GeminiSettings) -> Self {
        Self {
            backend: settings.backend,
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            project_id: settings.project_id.clone(),
            location: settings.location.clone(),
            access_token: settings.access_token.clone(),
            timeout: Duration::from_secs(settings.request_timeout_secs),
        }
    }
}

impl GeminiConfig {
    /// URL of the model resource, without a method suffix.
    fn model_url(&self) -> String {
        match self.backend {
            GeminiBackend::AiStudio => format!("{}/models/{}", AI_STUDIO_API_BASE, self.model),
            GeminiBackend::Vertex => {
                let host = if self.location == "global" {
                    "aiplatform.googleapis.com".to_string()
                } else {
                    format!("{}-aiplatform.googleapis.com", self.location)
                };
                format!(
                    "https://{}/v1/projects/{}/locations/{}/publishers/google/models/{}",
                    host, self.project_id, self.location, self.model
                )
            }
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}:{}", self.model_url(), method)
    }
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    fn authorize(&self, request: TracedRequest) -> TracedRequest {
        match self.config.backend {
            GeminiBackend::AiStudio => request.header("x-goog-api-key", &self.config.api_key),
            GeminiBackend::Vertex => request.bearer_auth(&self.config.access_token),
        }
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ProviderResponse, ProviderError> {
        if request.contents.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "At least one content block is required".to_string(),
            ));
        }

        let body = GenerateContentRequest::from(request);
        let url = self.config.method_url("generateContent");

        tracing::debug!(
            model = %self.config.model,
            backend = ?self.config.backend,
            content_count = request.contents.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .authorize(self.client.traced_post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        api_response.into_provider_response()
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match self.config.backend {
            GeminiBackend::AiStudio => {
                if self.config.api_key.is_empty() {
                    return Err(ProviderError::NotConfigured(
                        "Gemini API key not configured".to_string(),
                    ));
                }

                let response = self
                    .authorize(self.client.traced_get(&self.config.model_url()))
                    .send()
                    .await
                    .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

                if response.status().is_success() {
                    Ok(())
                } else {
                    Err(ProviderError::ApiError(format!(
                        "Health check failed: {}",
                        response.status()
                    )))
                }
            }
            // Vertex tokens are short-lived and minted outside this process;
            // readiness only asserts they were provided.
            GeminiBackend::Vertex => {
                if self.config.project_id.is_empty() || self.config.access_token.is_empty() {
                    Err(ProviderError::NotConfigured(
                        "Vertex AI project or access token not configured".to_string(),
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl From<&GenerateRequest> for GenerateContentRequest {
    fn from(request: &GenerateRequest) -> Self {
        Self {
            contents: request.contents.iter().map(WireContent::from).collect(),
            generation_config: GenerationConfig::from_params(&request.params),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

impl From<&Content> for WireContent {
    fn from(content: &Content) -> Self {
        Self {
            role: Some(content.role.as_str().to_string()),
            parts: content.parts.iter().map(WirePart::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl From<&Part> for WirePart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => WirePart {
                text: Some(text.clone()),
                ..Default::default()
            },
            Part::InlineDocument { mime_type, data } => WirePart {
                inline_data: Some(InlineData {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                }),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i32>,
}

impl GenerationConfig {
    fn from_params(params: &GenerationParams) -> Option<Self> {
        if params.temperature.is_none() && params.max_tokens.is_none() {
            return None;
        }
        Some(Self {
            temperature: params.temperature,
            max_output_tokens: params.max_tokens,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    fn into_provider_response(self) -> Result<ProviderResponse, ProviderError> {
        if self.candidates.is_empty()
            && self
                .prompt_feedback
                .as_ref()
                .is_some_and(|f| f.block_reason.is_some())
        {
            return Err(ProviderError::ContentFiltered);
        }

        let first = self.candidates.into_iter().next();

        let finish_reason = first
            .as_ref()
            .map(|c| match c.finish_reason.as_deref() {
                Some("STOP") | None => FinishReason::Complete,
                Some("MAX_TOKENS") => FinishReason::Length,
                Some("SAFETY") => FinishReason::ContentFilter,
                Some(_) => FinishReason::Other,
            })
            .unwrap_or(FinishReason::Complete);

        if finish_reason == FinishReason::ContentFilter {
            return Err(ProviderError::ContentFiltered);
        }

        let text = first
            .and_then(|c| c.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text);

        let usage = self.usage_metadata.unwrap_or_default();

        Ok(ProviderResponse {
            text,
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            finish_reason,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(backend: GeminiBackend) -> GeminiConfig {
        GeminiConfig {
            backend,
            model: "gemini-2.0-flash-001".to_string(),
            api_key: "key".to_string(),
            project_id: "proj".to_string(),
            location: "europe-west4".to_string(),
            access_token: "token".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn ai_studio_url() {
        assert_eq!(
            config(GeminiBackend::AiStudio).method_url("generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-001:generateContent"
        );
    }

    #[test]
    fn vertex_url_uses_regional_host() {
        assert_eq!(
            config(GeminiBackend::Vertex).method_url("generateContent"),
            "https://europe-west4-aiplatform.googleapis.com/v1/projects/proj/locations/europe-west4/publishers/google/models/gemini-2.0-flash-001:generateContent"
        );

        let mut global = config(GeminiBackend::Vertex);
        global.location = "global".to_string();
        assert!(global
            .model_url()
            .starts_with("https://aiplatform.googleapis.com/v1/projects/proj/locations/global/"));
    }

    #[test]
    fn request_serializes_document_then_prompt() {
        let request = GenerateRequest::new(vec![Content::user(vec![
            Part::InlineDocument {
                mime_type: "application/pdf".to_string(),
                data: "JVBERi0=".to_string(),
            },
            Part::text("Summarize this"),
        ])]);

        let body = serde_json::to_value(GenerateContentRequest::from(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"inlineData": {"mimeType": "application/pdf", "data": "JVBERi0="}},
                        {"text": "Summarize this"}
                    ]
                }]
            })
        );
    }

    #[test]
    fn generation_config_only_when_params_set() {
        let mut request = GenerateRequest::new(vec![Content::user(vec![Part::text("hi")])]);
        request.params.temperature = Some(0.2);

        let body = serde_json::to_value(GenerateContentRequest::from(&request)).unwrap();
        assert_eq!(body["generationConfig"], json!({"temperature": 0.2f32}));
    }

    #[test]
    fn response_extracts_first_text_part() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "It is on page 3."}, {"text": "ignored"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 7, "totalTokenCount": 127}
        }))
        .unwrap();

        let parsed = response.into_provider_response().unwrap();
        assert_eq!(parsed.text.as_deref(), Some("It is on page 3."));
        assert_eq!(parsed.input_tokens, 120);
        assert_eq!(parsed.output_tokens, 7);
        assert_eq!(parsed.finish_reason, FinishReason::Complete);
    }

    #[test]
    fn response_without_candidates_has_no_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        let parsed = response.into_provider_response().unwrap();
        assert!(parsed.text.is_none());
    }

    #[test]
    fn blocked_prompt_is_content_filtered() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();

        assert!(matches!(
            response.into_provider_response(),
            Err(ProviderError::ContentFiltered)
        ));
    }

    #[test]
    fn safety_finish_is_content_filtered() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();

        assert!(matches!(
            response.into_provider_response(),
            Err(ProviderError::ContentFiltered)
        ));
    }
}
