//! Test helpers for docqa-service integration tests.
//!
//! Spawns the real HTTP server on a random port with a scripted mock model.

#![allow(dead_code)]

use docqa_service::config::{DocQaConfig, GeminiBackend, GeminiSettings, LimitsConfig};
use docqa_service::services::metrics::init_metrics;
use docqa_service::services::providers::mock::{MockReply, MockTextProvider};
use docqa_service::services::SessionStore;
use docqa_service::startup::Application;
use reqwest::multipart::{Form, Part};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub const PDF_BYTES: &[u8] = b"%PDF-1.7 quarterly report, page 4: revenue grew 12%";
pub const PDF_BASE64: &str = "JVBERi0xLjcgcXVhcnRlcmx5IHJlcG9ydCwgcGFnZSA0OiByZXZlbnVlIGdyZXcgMTIl";

pub const QUIZ_ITEM: &str = r#"{"question": "How much did revenue grow?", "options": {"A": "2%", "B": "12%", "C": "20%", "D": "21%"}, "correct": "B", "explanation": "Page 4: \"revenue grew 12%\""}"#;

pub fn test_config(max_document_bytes: usize) -> DocQaConfig {
    DocQaConfig {
        common: CoreConfig {
            port: 0,
            ..CoreConfig::default()
        },
        gemini: GeminiSettings {
            backend: GeminiBackend::AiStudio,
            model: "gemini-2.0-flash-001".to_string(),
            api_key: "test-api-key".to_string(),
            project_id: String::new(),
            location: "us-central1".to_string(),
            access_token: String::new(),
            request_timeout_secs: 5,
            temperature: None,
            max_output_tokens: None,
        },
        limits: LimitsConfig {
            max_document_bytes,
            max_quiz_questions: 10,
            default_quiz_questions: 3,
        },
    }
}

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub provider: Arc<MockTextProvider>,
    pub sessions: Arc<dyn SessionStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn the service with a mock model that answers `replies` in order.
    pub async fn spawn(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self::spawn_with(test_config(1024 * 1024), MockTextProvider::with_replies(replies)).await
    }

    pub async fn spawn_with(config: DocQaConfig, provider: MockTextProvider) -> Self {
        init_metrics().expect("Failed to initialize metrics");

        let provider = Arc::new(provider);
        let app = Application::build_with_provider(config, provider.clone())
            .await
            .expect("Failed to build application");

        let port = app.port();
        let sessions = app.state().sessions.clone();

        tokio::spawn(app.run_until_stopped());

        Self {
            address: format!("http://127.0.0.1:{}", port),
            port,
            provider,
            sessions,
            client: reqwest::Client::new(),
        }
    }

    pub async fn upload(&self, form: Form) -> reqwest::Response {
        self.client
            .post(format!("{}/api/upload-and-query", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Upload `PDF_BYTES` with `query` and return the new session id.
    pub async fn upload_pdf(&self, query: &str) -> String {
        let response = self.upload(pdf_form(query)).await;
        assert_eq!(response.status().as_u16(), 200);

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        body["sessionId"]
            .as_str()
            .expect("sessionId missing")
            .to_string()
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

pub fn document_part(bytes: &[u8], mime_type: &str) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name("report.pdf")
        .mime_str(mime_type)
        .expect("Invalid mime type")
}

pub fn pdf_form(query: &str) -> Form {
    Form::new()
        .part("document", document_part(PDF_BYTES, "application/pdf"))
        .text("query", query.to_string())
}
