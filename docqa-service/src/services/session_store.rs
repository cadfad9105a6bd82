//! Session registry: maps opaque session ids to uploaded documents.
//!
//! Sessions live for the lifetime of the process. There is no update, delete
//! or expiry; a returned id resolves to the same document until restart.

use crate::models::{Session, StoredDocument};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::{distributions::Uniform, Rng};
use service_core::error::AppError;
use std::sync::Arc;

/// Attempts at finding a free id before giving up.
const MAX_ID_ATTEMPTS: usize = 8;

const RANDOM_SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `document` under a fresh id and return the new session.
    async fn create(&self, document: StoredDocument) -> Result<Arc<Session>, AppError>;

    /// Look up a session. Unknown ids yield `None`.
    async fn get(&self, session_id: &str) -> Option<Arc<Session>>;

    /// Number of live sessions.
    async fn len(&self) -> usize;
}

/// Process-local store backed by a concurrent map.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, Arc<Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_with<F>(&self, document: StoredDocument, mut next_id: F) -> Result<Arc<Session>, AppError>
    where
        F: FnMut() -> String,
    {
        for _ in 0..MAX_ID_ATTEMPTS {
            let session_id = next_id();
            match self.sessions.entry(session_id) {
                Entry::Occupied(entry) => {
                    tracing::warn!(session_id = %entry.key(), "Session id collision, regenerating");
                }
                Entry::Vacant(entry) => {
                    let session = Arc::new(Session::new(entry.key().clone(), document));
                    entry.insert(session.clone());
                    return Ok(session);
                }
            }
        }

        Err(AppError::InternalError(anyhow::anyhow!(
            "Could not allocate a unique session id after {} attempts",
            MAX_ID_ATTEMPTS
        )))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, document: StoredDocument) -> Result<Arc<Session>, AppError> {
        self.insert_with(document, generate_session_id)
    }

    async fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.get(session_id).map(|entry| entry.value().clone())
    }

    async fn len(&self) -> usize {
        self.sessions.len()
    }
}

/// `s-<millis base36>-<6 random base36 chars>`.
pub fn generate_session_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let suffix: String = rand::thread_rng()
        .sample_iter(Uniform::from(0..BASE36.len()))
        .take(RANDOM_SUFFIX_LEN)
        .map(|i| BASE36[i] as char)
        .collect();

    format!("s-{}-{}", to_base36(millis), suffix)
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn document(bytes: &[u8], mime_type: &str) -> StoredDocument {
        StoredDocument::from_bytes(bytes, mime_type.to_string(), None)
    }

    #[test]
    fn session_ids_have_expected_shape() {
        let id = generate_session_id();
        let parts: Vec<&str> = id.split('-').collect();

        assert_eq!(parts.len(), 3, "{id}");
        assert_eq!(parts[0], "s");
        assert_eq!(parts[2].len(), RANDOM_SUFFIX_LEN);
        assert!(id[2..]
            .chars()
            .all(|c| c == '-' || c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }

    #[tokio::test]
    async fn created_session_resolves_to_same_document() {
        let store = InMemorySessionStore::new();
        let session = store
            .create(document(b"hello", "text/plain"))
            .await
            .unwrap();

        let found = store.get(&session.session_id).await.unwrap();
        assert_eq!(found.mime_type(), "text/plain");
        assert_eq!(found.payload(), "aGVsbG8=");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = InMemorySessionStore::new();
        assert!(store.get("s-nope-000000").await.is_none());
        assert!(store.get("").await.is_none());
    }

    #[test]
    fn collision_regenerates_instead_of_overwriting() {
        let store = InMemorySessionStore::new();
        let mut ids = vec!["s-b".to_string(), "s-a".to_string(), "s-a".to_string()];

        let first = store
            .insert_with(document(b"one", "text/plain"), || ids.pop().unwrap())
            .unwrap();
        let second = store
            .insert_with(document(b"two", "text/plain"), || ids.pop().unwrap())
            .unwrap();

        assert_eq!(first.session_id, "s-a");
        assert_eq!(second.session_id, "s-b");
        assert_eq!(store.sessions.get("s-a").unwrap().payload(), "b25l");
    }

    #[test]
    fn gives_up_when_no_free_id_is_found() {
        let store = InMemorySessionStore::new();
        store
            .insert_with(document(b"one", "text/plain"), || "s-fixed".to_string())
            .unwrap();

        let result = store.insert_with(document(b"two", "text/plain"), || "s-fixed".to_string());
        assert!(matches!(result, Err(AppError::InternalError(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_get_distinct_ids() {
        let store = Arc::new(InMemorySessionStore::new());

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let body = format!("document {i}");
                    let session = store
                        .create(document(body.as_bytes(), "text/plain"))
                        .await
                        .unwrap();
                    (session.session_id.clone(), body)
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            let (id, body) = handle.await.unwrap();
            let stored = store.get(&id).await.unwrap();
            assert_eq!(stored.document, document(body.as_bytes(), "text/plain"));
            assert!(ids.insert(id));
        }
        assert_eq!(store.len().await, 64);
    }
}
