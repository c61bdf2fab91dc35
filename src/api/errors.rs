//! API Error Handling
//!
//! Structured error responses with HTTP status codes and request tracking.

use crate::errors::WagerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Top-level API error response with request tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code (INVALID_BET, INSUFFICIENT_FUNDS, UNAUTHORIZED, ...)
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub retryable: bool,
}

#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
}

#[derive(Debug)]
pub enum ApiErrorKind {
    Wager(WagerError),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
}

impl ApiError {
    pub fn wager(request_id: String, error: WagerError) -> Self {
        Self {
            kind: ApiErrorKind::Wager(error),
            request_id,
        }
    }

    pub fn bad_request(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::BadRequest(message),
            request_id,
        }
    }

    pub fn unauthorized(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized(message),
            request_id,
        }
    }

    pub fn forbidden(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::Forbidden(message),
            request_id,
        }
    }

    pub fn status(&self) -> StatusCode {
        match &self.kind {
            ApiErrorKind::Wager(error) => wager_status(error),
            ApiErrorKind::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiErrorKind::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiErrorKind::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

fn wager_status(error: &WagerError) -> StatusCode {
    match error {
        WagerError::UnknownUser(_) => StatusCode::NOT_FOUND,
        WagerError::DailyLimitReached { .. } => StatusCode::TOO_MANY_REQUESTS,
        WagerError::Conflict(_) => StatusCode::CONFLICT,
        WagerError::ConfigurationUnavailable(_) | WagerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn wager_details(error: &WagerError) -> Option<serde_json::Value> {
    match error {
        WagerError::InsufficientFunds { balance, required } => Some(json!({ "balance": balance, "required": required })),
        WagerError::OutOfRange { position, limit } => Some(json!({ "position": position, "limit": limit })),
        WagerError::AlreadyRevealed(position) => Some(json!({ "position": position })),
        WagerError::DailyLimitReached { limit } => Some(json!({ "limit": limit })),
        _ => None,
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ApiErrorKind::Wager(error) => write!(f, "[{}] {}", self.request_id, error),
            ApiErrorKind::BadRequest(msg) => write!(f, "[{}] Bad Request: {}", self.request_id, msg),
            ApiErrorKind::Unauthorized(msg) => write!(f, "[{}] Unauthorized: {}", self.request_id, msg),
            ApiErrorKind::Forbidden(msg) => write!(f, "[{}] Forbidden: {}", self.request_id, msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, details, retryable) = match &self.kind {
            ApiErrorKind::Wager(error) => (error.code(), error.to_string(), wager_details(error), error.is_retryable()),
            ApiErrorKind::BadRequest(msg) => ("BAD_REQUEST", msg.clone(), None, false),
            ApiErrorKind::Unauthorized(msg) => ("UNAUTHORIZED", msg.clone(), None, false),
            ApiErrorKind::Forbidden(msg) => ("FORBIDDEN", msg.clone(), None, false),
        };

        let body = Json(ErrorResponse {
            request_id: self.request_id,
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
                retryable,
            },
        });

        (status, body).into_response()
    }
}
