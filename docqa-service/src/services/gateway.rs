//! Single entry point for model calls made by the handlers.
//!
//! Times the call, records token usage, and turns provider failures into
//! `AppError`s. Empty completions are not errors here; each handler decides
//! what an empty answer means.

use super::metrics;
use super::providers::{GenerateRequest, ProviderError, ProviderResponse, TextProvider};
use service_core::error::AppError;
use std::time::Instant;

pub async fn complete(
    provider: &dyn TextProvider,
    request: &GenerateRequest,
) -> Result<ProviderResponse, AppError> {
    let start = Instant::now();
    let result = provider.generate(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    metrics::record_provider_latency(provider.name(), provider.model(), elapsed);

    match result {
        Ok(response) => {
            metrics::record_tokens(
                provider.model(),
                response.input_tokens,
                response.output_tokens,
            );
            tracing::debug!(
                provider = provider.name(),
                model = provider.model(),
                input_tokens = response.input_tokens,
                output_tokens = response.output_tokens,
                finish_reason = response.finish_reason.as_str(),
                has_text = response.non_empty_text().is_some(),
                elapsed_secs = elapsed,
                "Model call completed"
            );
            Ok(response)
        }
        Err(err) => {
            metrics::record_provider_error(provider.name(), err.kind());
            tracing::error!(
                provider = provider.name(),
                model = provider.model(),
                error = %err,
                elapsed_secs = elapsed,
                "Model call failed"
            );
            Err(provider_error_to_app_error(err))
        }
    }
}

fn provider_error_to_app_error(error: ProviderError) -> AppError {
    match error {
        ProviderError::NotConfigured(_) => AppError::ServiceUnavailable,
        ProviderError::RateLimited => {
            AppError::BadGateway("Rate limited by the model backend".to_string())
        }
        ProviderError::ContentFiltered => {
            AppError::BadGateway("The model backend blocked this request".to_string())
        }
        other => AppError::BadGateway(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::{MockReply, MockTextProvider};
    use crate::services::providers::{Content, Part};

    fn request() -> GenerateRequest {
        GenerateRequest::new(vec![Content::user(vec![Part::text("hi")])])
    }

    #[tokio::test]
    async fn passes_through_successful_responses() {
        let provider = MockTextProvider::with_replies([MockReply::Text("hello".to_string())]);
        let response = complete(&provider, &request()).await.unwrap();
        assert_eq!(response.text.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn network_failures_become_bad_gateway() {
        let provider = MockTextProvider::with_replies([MockReply::Fail(
            ProviderError::NetworkError("connection reset".to_string()),
        )]);

        let err = complete(&provider, &request()).await.unwrap_err();
        assert!(matches!(err, AppError::BadGateway(msg) if msg.contains("connection reset")));
    }

    #[tokio::test]
    async fn unconfigured_provider_is_unavailable() {
        let provider = MockTextProvider::new(false);
        let err = complete(&provider, &request()).await.unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable));
    }
}
