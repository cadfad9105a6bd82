use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use super::{non_blank, resolve_session};
use crate::dtos::GenerateMcqRequest;
use crate::extract::ApiJson;
use crate::services::prompts::quiz_prompt;
use crate::services::providers::{Content, GenerateRequest, Part};
use crate::services::{gateway, metrics, parse_quiz};
use crate::startup::AppState;
use service_core::error::AppError;

const MISSING_SESSION: &str = "Missing session ID.";

/// Generate multiple-choice questions from a session's document.
///
/// Responds with the bare JSON array of quiz items. A completion that cannot
/// be turned into quiz items yields `{ error, raw }` with status 502.
#[tracing::instrument(skip_all)]
pub async fn generate_mcq(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateMcqRequest>,
) -> Result<Response, AppError> {
    let session_id = non_blank(request.session_id.clone())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!(MISSING_SESSION)))?;

    request.validate()?;

    let limits = &state.config.limits;
    let count = request.count.unwrap_or(limits.default_quiz_questions);
    if count > limits.max_quiz_questions {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "At most {} questions can be generated per request.",
            limits.max_quiz_questions
        )));
    }

    let session = resolve_session(state.sessions.as_ref(), &session_id).await?;
    tracing::info!(
        session_id = %session.session_id,
        question_count = count,
        "Generating quiz"
    );

    let prompt = quiz_prompt(count, request.context.as_deref());
    let request = GenerateRequest::new(vec![Content::user(vec![
        Part::InlineDocument {
            mime_type: session.mime_type().to_string(),
            data: session.payload().to_string(),
        },
        Part::text(prompt),
    ])])
    .with_params(state.config.gemini.generation_params());

    let response = gateway::complete(state.text_provider.as_ref(), &request).await?;

    match parse_quiz(response.text.as_deref(), count) {
        Ok(items) => Ok(Json(items).into_response()),
        Err(err) => {
            metrics::record_quiz_parse_failure(err.reason());
            tracing::warn!(
                session_id = %session.session_id,
                reason = err.reason(),
                error = %err,
                "Quiz completion could not be parsed"
            );
            Ok(err.into_response())
        }
    }
}
