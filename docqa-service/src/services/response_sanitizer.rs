//! Cleanup and parsing of model output that is supposed to be JSON.
//!
//! Models wrap JSON in Markdown fences and sprinkle newlines through it. The
//! cleanup rules live here, apart from the handlers, so they can change
//! without touching request flow.

use crate::models::QuizItem;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

const FENCE_WITH_TAG: &str = "```json";
const FENCE: &str = "```";

/// Why a quiz could not be produced from the model's completion.
///
/// Every variant keeps the untouched model text for diagnostics.
#[derive(Debug, Error)]
pub enum QuizGenerationError {
    #[error("Model response is undefined or empty.")]
    EmptyResponse { raw: Option<String> },

    #[error("Model response could not be parsed as JSON.")]
    InvalidJson {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Expected an array of MCQs, but got something else.")]
    NotArray { raw: String },

    #[error("Model response did not match the quiz item format.")]
    SchemaMismatch {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

impl QuizGenerationError {
    /// Short label for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            QuizGenerationError::EmptyResponse { .. } => "empty_response",
            QuizGenerationError::InvalidJson { .. } => "invalid_json",
            QuizGenerationError::NotArray { .. } => "not_array",
            QuizGenerationError::SchemaMismatch { .. } => "schema_mismatch",
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            QuizGenerationError::EmptyResponse { raw } => raw.as_deref(),
            QuizGenerationError::InvalidJson { raw, .. }
            | QuizGenerationError::NotArray { raw }
            | QuizGenerationError::SchemaMismatch { raw, .. } => Some(raw),
        }
    }
}

impl IntoResponse for QuizGenerationError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct QuizErrorResponse<'a> {
            error: String,
            reason: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            raw: Option<&'a str>,
        }

        let body = QuizErrorResponse {
            error: self.to_string(),
            reason: self.reason(),
            raw: self.raw(),
        };

        (StatusCode::BAD_GATEWAY, Json(body)).into_response()
    }
}

/// Strip code fences (with or without a `json` tag) and line breaks, then trim.
///
/// Idempotent: cleaning already-clean text returns it unchanged.
pub fn sanitize_model_json(raw: &str) -> String {
    raw.replace(FENCE_WITH_TAG, "")
        .replace(FENCE, "")
        .replace(['\n', '\r'], "")
        .trim()
        .to_string()
}

/// Turn a quiz completion into quiz items.
///
/// A length other than `requested` is accepted; the model is not bound to the
/// count.
pub fn parse_quiz(raw: Option<&str>, requested: u32) -> Result<Vec<QuizItem>, QuizGenerationError> {
    let raw = match raw {
        Some(text) if !text.is_empty() => text,
        other => {
            return Err(QuizGenerationError::EmptyResponse {
                raw: other.map(str::to_string),
            })
        }
    };

    let cleaned = sanitize_model_json(raw);

    let value: serde_json::Value =
        serde_json::from_str(&cleaned).map_err(|source| QuizGenerationError::InvalidJson {
            raw: raw.to_string(),
            source,
        })?;

    if !value.is_array() {
        return Err(QuizGenerationError::NotArray {
            raw: raw.to_string(),
        });
    }

    let items: Vec<QuizItem> =
        serde_json::from_value(value).map_err(|source| QuizGenerationError::SchemaMismatch {
            raw: raw.to_string(),
            source,
        })?;

    if items.len() != requested as usize {
        tracing::warn!(
            requested,
            received = items.len(),
            "Model returned a different number of quiz questions than requested"
        );
    }

    Ok(items)
}
