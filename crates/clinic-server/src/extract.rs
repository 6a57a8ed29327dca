//! Extractors whose rejections render as the failure envelope.

use axum::extract::{FromRequest, FromRequestParts};
use clinic_api::ApiError;

/// JSON body extractor; malformed or mistyped bodies become 400 envelopes.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Query-string extractor with envelope rejections.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);
