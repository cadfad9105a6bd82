//! Mock provider for tests and local runs without credentials.

use super::{FinishReason, GenerateRequest, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted reply for one `generate` call.
#[derive(Debug)]
pub enum MockReply {
    Text(String),
    /// A successful call whose first candidate carries no text.
    Empty,
    Fail(ProviderError),
}

/// Mock text provider.
///
/// Replies are consumed in order; once the script runs out every call echoes
/// the last text part of the request. Every call is counted and recorded.
pub struct MockTextProvider {
    enabled: bool,
    replies: Mutex<VecDeque<MockReply>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            replies: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let provider = Self::new(true);
        provider.push_replies(replies);
        provider
    }

    pub fn push_replies(&self, replies: impl IntoIterator<Item = MockReply>) {
        if let Ok(mut queue) = self.replies.lock() {
            queue.extend(replies);
        }
    }

    /// Number of `generate` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests in the order they were received.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.requests().pop()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        let reply = self.replies.lock().ok().and_then(|mut queue| queue.pop_front());

        let text = match reply {
            Some(MockReply::Text(text)) => Some(text),
            Some(MockReply::Empty) => None,
            Some(MockReply::Fail(err)) => return Err(err),
            None => {
                let prompt = request
                    .contents
                    .iter()
                    .flat_map(|c| c.parts.iter())
                    .filter_map(|p| match p {
                        super::Part::Text(text) => Some(text.as_str()),
                        super::Part::InlineDocument { .. } => None,
                    })
                    .last()
                    .unwrap_or_default();
                Some(format!("Mock response for: {}", prompt))
            }
        };

        Ok(ProviderResponse {
            output_tokens: text.as_ref().map_or(0, |t| t.len() as i32 / 4),
            text,
            input_tokens: 10,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{Content, Part};

    fn request(prompt: &str) -> GenerateRequest {
        GenerateRequest::new(vec![Content::user(vec![Part::text(prompt)])])
    }

    #[tokio::test]
    async fn replays_script_then_echoes() {
        let provider = MockTextProvider::with_replies([
            MockReply::Text("first".to_string()),
            MockReply::Empty,
        ]);

        let first = provider.generate(&request("a")).await.unwrap();
        let second = provider.generate(&request("b")).await.unwrap();
        let third = provider.generate(&request("c")).await.unwrap();

        assert_eq!(first.text.as_deref(), Some("first"));
        assert!(second.text.is_none());
        assert_eq!(third.text.as_deref(), Some("Mock response for: c"));
        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.last_request().unwrap(), request("c"));
    }

    #[tokio::test]
    async fn disabled_provider_fails_but_still_counts() {
        let provider = MockTextProvider::new(false);
        assert!(provider.generate(&request("a")).await.is_err());
        assert!(provider.health_check().await.is_err());
        assert_eq!(provider.call_count(), 1);
    }
}
