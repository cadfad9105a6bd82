//! Request extractors whose rejections render as `AppError` JSON bodies.

use axum::extract::FromRequest;
use service_core::error::AppError;

/// `axum::Json` with malformed bodies reported as `{ "error": ... }`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
