//! Session model: an uploaded document kept server-side for follow-up calls.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};

/// A document as received from the client, before a session exists for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Base64 of the raw document bytes, exactly as sent to the model.
    pub payload: String,

    /// Declared media type, echoed verbatim on every model call.
    pub mime_type: String,

    /// Original file name from the upload, informational only.
    pub file_name: Option<String>,

    /// Size of the decoded document.
    pub size_bytes: usize,
}

impl StoredDocument {
    /// Encode raw upload bytes into their text-safe form.
    pub fn from_bytes(bytes: &[u8], mime_type: String, file_name: Option<String>) -> Self {
        Self {
            payload: STANDARD.encode(bytes),
            mime_type,
            file_name,
            size_bytes: bytes.len(),
        }
    }
}

/// One uploaded document available for follow-up queries and quizzes.
///
/// Immutable once created; the registry hands out shared references.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,

    pub document: StoredDocument,

    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(session_id: String, document: StoredDocument) -> Self {
        Self {
            session_id,
            document,
            created_at: Utc::now(),
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.document.mime_type
    }

    pub fn payload(&self) -> &str {
        &self.document.payload
    }

    /// Time since the document was uploaded.
    pub fn age(&self) -> Duration {
        Utc::now() - self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_encodes_payload_and_keeps_mime_type() {
        let doc = StoredDocument::from_bytes(
            b"%PDF-1.7",
            "application/pdf".to_string(),
            Some("a.pdf".to_string()),
        );

        assert_eq!(doc.payload, "JVBERi0xLjc=");
        assert_eq!(doc.mime_type, "application/pdf");
        assert_eq!(doc.size_bytes, 8);
        assert_eq!(STANDARD.decode(&doc.payload).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn age_counts_from_creation() {
        let mut session = Session::new(
            "s-1-abcdef".to_string(),
            StoredDocument::from_bytes(b"x", "text/plain".to_string(), None),
        );
        session.created_at -= Duration::seconds(90);

        assert!(session.age().num_seconds() >= 90);
    }
}
