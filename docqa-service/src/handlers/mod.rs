//! HTTP handlers for the document Q&A service.

pub mod health;
pub mod query;
pub mod quiz;
pub mod upload;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use query::query_document;
pub use quiz::generate_mcq;
pub use upload::upload_and_query;

use crate::models::Session;
use crate::services::SessionStore;
use service_core::error::AppError;
use std::sync::Arc;

pub(crate) const SESSION_NOT_FOUND: &str = "Invalid or expired session ID.";

/// Treat absent and blank values alike.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub(crate) async fn resolve_session(
    sessions: &dyn SessionStore,
    session_id: &str,
) -> Result<Arc<Session>, AppError> {
    let session = sessions.get(session_id).await.ok_or_else(|| {
        tracing::info!(session_id = %session_id, "Unknown session id");
        AppError::NotFound(anyhow::anyhow!(SESSION_NOT_FOUND))
    })?;

    tracing::debug!(
        session_id = %session.session_id,
        session_age_secs = session.age().num_seconds(),
        "Resolved session"
    );
    Ok(session)
}
