use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use clinic_storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const JSON_CONTENT_TYPE: &str = "application/json";

fn json_body<T: Serialize>(
    status: StatusCode,
    value: &T,
    extra: Vec<(HeaderName, HeaderValue)>,
) -> Response {
    let body = match serde_json::to_vec(value) {
        Ok(b) => b,
        Err(err) => {
            tracing::error!(error = %err, "response serialization failed");
            serde_json::to_vec(&ErrorBody::new("Serialization failure"))
                .unwrap_or_else(|_| b"{}".to_vec())
        }
    };

    let mut response = Response::new(axum::body::Body::from(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    for (name, value) in extra {
        headers.insert(name, value);
    }
    response
}

// -------------------------
// Errors
// -------------------------

/// Failure envelope: `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// High-level API errors mapped to HTTP status codes and the failure envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    #[error("Too many requests: {0}")]
    TooManyRequests(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::MethodNotAllowed(msg.into())
    }
    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::PayloadTooLarge(msg.into())
    }
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::NotImplemented(msg.into())
    }
    pub fn too_many_requests(msg: impl Into<String>) -> Self {
        Self::TooManyRequests(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The client-facing message, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::MethodNotAllowed(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::NotImplemented(msg)
            | ApiError::TooManyRequests(msg)
            | ApiError::Internal(msg) => msg,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody::new(self.message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(msg) = &self {
            tracing::error!(error = %msg, "request failed");
        }
        json_body(self.status_code(), &self.to_body(), Vec::new())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { kind, .. } => Self::NotFound(kind.not_found_message()),
            StorageError::InvalidRecord { message } => Self::BadRequest(message),
            other => {
                tracing::error!(category = %other.category(), error = %other, "storage failure");
                Self::Internal("Internal server error".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Body cut off by the request size limit
            JsonRejection::BytesRejection(ref inner)
                if inner.status() == StatusCode::PAYLOAD_TOO_LARGE =>
            {
                Self::PayloadTooLarge("Request body too large".to_string())
            }
            other => Self::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

// -------------------------
// Success envelope
// -------------------------

/// Page metadata attached to list responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

impl Pagination {
    /// `total_pages` is `ceil(total / limit)`; a zero limit counts as one.
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let per_page = u64::from(limit.max(1));
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// Success envelope: `{"success": true, "data": ..., "pagination"?, "message"?}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            pagination: None,
            message: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub envelope: Envelope<T>,
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, status: StatusCode) -> Self {
        Self {
            envelope: Envelope::new(data),
            status,
            headers: Vec::new(),
        }
    }

    pub fn ok(data: T) -> Self {
        Self::new(data, StatusCode::OK)
    }

    pub fn created(data: T) -> Self {
        Self::new(data, StatusCode::CREATED)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.envelope.message = Some(message.into());
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.envelope.pagination = Some(pagination);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        json_body(self.status, &self.envelope, self.headers)
    }
}
