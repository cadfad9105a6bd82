use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        Multipart, State,
    },
    Json,
};

use super::non_blank;
use crate::dtos::UploadAndQueryResponse;
use crate::models::StoredDocument;
use crate::services::metrics;
use crate::services::gateway;
use crate::services::prompts::{GROUNDING_INSTRUCTIONS, NO_ANSWER};
use crate::services::providers::{Content, GenerateRequest, Part};
use crate::startup::AppState;
use service_core::error::{AppError, UPLOAD_LIMIT_EXCEEDED};

pub const DOCUMENT_FIELD: &str = "document";
pub const QUERY_FIELD: &str = "query";

const MISSING_INPUT: &str = "Missing file or query.";
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

struct UploadForm {
    document: Option<StoredDocument>,
    query: Option<String>,
}

/// Answer a first question about a freshly uploaded document and open a
/// session for follow-ups.
///
/// The session is only created once the model call has succeeded.
#[tracing::instrument(skip_all)]
pub async fn upload_and_query(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadAndQueryResponse>, AppError> {
    let multipart = multipart.map_err(|rejection| {
        tracing::info!(rejection = %rejection.body_text(), "Upload was not a multipart form");
        AppError::BadRequest(anyhow::anyhow!(MISSING_INPUT))
    })?;

    let form = read_form(multipart, state.config.limits.max_document_bytes).await?;
    let (document, query) = match (form.document, non_blank(form.query)) {
        (Some(document), Some(query)) => (document, query),
        _ => return Err(AppError::BadRequest(anyhow::anyhow!(MISSING_INPUT))),
    };

    tracing::info!(
        mime_type = %document.mime_type,
        document_bytes = document.size_bytes,
        file_name = document.file_name.as_deref().unwrap_or("unnamed"),
        "Answering question on uploaded document"
    );

    let request = GenerateRequest::new(vec![
        Content::user(vec![Part::text(GROUNDING_INSTRUCTIONS)]),
        Content::user(vec![
            Part::InlineDocument {
                mime_type: document.mime_type.clone(),
                data: document.payload.clone(),
            },
            Part::text(query),
        ]),
    ])
    .with_params(state.config.gemini.generation_params());

    let response = gateway::complete(state.text_provider.as_ref(), &request).await?;
    let answer = response.non_empty_text().unwrap_or(NO_ANSWER).to_string();

    let session = state.sessions.create(document).await?;
    metrics::record_session_created(state.sessions.len().await);

    tracing::info!(session_id = %session.session_id, "Document session created");

    Ok(Json(UploadAndQueryResponse {
        answer,
        session_id: session.session_id.clone(),
    }))
}

async fn read_form(
    mut multipart: Multipart,
    max_document_bytes: usize,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm {
        document: None,
        query: None,
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(DOCUMENT_FIELD) => {
                form.document = read_document(field, max_document_bytes).await?;
            }
            Some(QUERY_FIELD) => {
                form.query = Some(field.text().await?);
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unexpected form field");
            }
        }
    }

    Ok(form)
}

/// An empty file part counts as no document.
async fn read_document(
    field: Field<'_>,
    max_document_bytes: usize,
) -> Result<Option<StoredDocument>, AppError> {
    let mime_type = field
        .content_type()
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string();
    let file_name = field.file_name().map(str::to_string);

    let bytes = field.bytes().await?;
    if bytes.is_empty() {
        return Ok(None);
    }
    if bytes.len() > max_document_bytes {
        tracing::info!(
            document_bytes = bytes.len(),
            max_document_bytes,
            "Rejecting oversized document"
        );
        return Err(AppError::PayloadTooLarge(anyhow::anyhow!(UPLOAD_LIMIT_EXCEEDED)));
    }

    Ok(Some(StoredDocument::from_bytes(&bytes, mime_type, file_name)))
}
