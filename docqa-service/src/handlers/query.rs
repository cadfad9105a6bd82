use axum::{extract::State, Json};

use super::{non_blank, resolve_session};
use crate::dtos::{QueryDocumentRequest, QueryDocumentResponse};
use crate::extract::ApiJson;
use crate::services::gateway;
use crate::services::prompts::NO_ANSWER;
use crate::services::providers::{Content, GenerateRequest, Part};
use crate::startup::AppState;
use service_core::error::AppError;

const MISSING_INPUT: &str = "Missing query or session ID.";

/// Answer a follow-up question against a session's document.
///
/// Only the stored document and the new question are sent; earlier questions
/// are not replayed.
#[tracing::instrument(skip_all)]
pub async fn query_document(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<QueryDocumentRequest>,
) -> Result<Json<QueryDocumentResponse>, AppError> {
    let (query, session_id) = match (non_blank(request.query), non_blank(request.session_id)) {
        (Some(query), Some(session_id)) => (query, session_id),
        _ => return Err(AppError::BadRequest(anyhow::anyhow!(MISSING_INPUT))),
    };

    let session = resolve_session(state.sessions.as_ref(), &session_id).await?;
    tracing::info!(session_id = %session.session_id, "Answering follow-up question");

    let request = GenerateRequest::new(vec![Content::user(vec![
        Part::InlineDocument {
            mime_type: session.mime_type().to_string(),
            data: session.payload().to_string(),
        },
        Part::text(query),
    ])])
    .with_params(state.config.gemini.generation_params());

    let response = gateway::complete(state.text_provider.as_ref(), &request).await?;
    let answer = response.non_empty_text().unwrap_or(NO_ANSWER).to_string();

    Ok(Json(QueryDocumentResponse { answer }))
}
