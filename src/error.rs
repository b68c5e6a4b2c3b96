/*
 * Responsibility
 * - ゲートウェイ共通の AppError 定義
 * - downstream error の分類 (classify) と外向き JSON への正規化
 * - IntoResponse 実装 (HTTP status / JSON error body)
 */
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::capability::{DownstreamError, DownstreamErrorKind, FieldViolation};

/// Known status codes and their short labels.
pub const STATUS_CODE_MAP: [(u16, &str); 5] = [
    (400, "BAD_REQUEST"),
    (401, "UNAUTHORIZED"),
    (403, "FORBIDDEN"),
    (404, "NOT_FOUND"),
    (500, "UNKNOWN_ERROR"),
];

pub const VALIDATION_STATUS: &str = "VALIDATION_ERROR";

const INVALID_TOKEN_MESSAGE: &str = "Invalid authorization token";

pub fn status_label(status_code: u16) -> Option<&'static str> {
    STATUS_CODE_MAP
        .iter()
        .find(|(code, _)| *code == status_code)
        .map(|(_, label)| *label)
}

/// Outward error shape for failures raised by capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// The two auth failures keep their historical shapes.
#[derive(Serialize)]
struct AuthMissingBody {
    code: u16,
    error: &'static str,
}

#[derive(Serialize)]
struct AuthRejectedBody<'a> {
    code: u16,
    error: RejectionMessage<'a>,
}

#[derive(Serialize)]
struct RejectionMessage<'a> {
    message: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("invalid authorization token")]
    AuthMissing,
    #[error("authorization rejected: {message}")]
    AuthRejected { message: String },
    #[error("validation error: {message}")]
    Validation {
        violations: Vec<FieldViolation>,
        message: String,
    },
    #[error("downstream error ({status_code}): {message}")]
    Downstream {
        status_code: u16,
        status_label: Option<String>,
        message: String,
    },
}

impl AppError {
    /// Downstream failure with the label looked up from `STATUS_CODE_MAP`.
    pub fn downstream(status_code: u16, message: impl Into<String>) -> Self {
        Self::Downstream {
            status_code,
            status_label: status_label(status_code).map(str::to_owned),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            AppError::AuthMissing => 401,
            AppError::AuthRejected { .. } => 403,
            AppError::Validation { .. } => 400,
            AppError::Downstream { status_code, .. } => *status_code,
        }
    }

    /// Downstream-shaped body. The two auth failures have their own shapes.
    pub fn envelope(&self) -> Option<ErrorEnvelope> {
        let (message, status) = match self {
            AppError::AuthMissing | AppError::AuthRejected { .. } => return None,
            AppError::Validation { message, .. } => (message, Some(VALIDATION_STATUS)),
            AppError::Downstream {
                status_label,
                message,
                ..
            } => (message, status_label.as_deref()),
        };

        Some(ErrorEnvelope {
            message: message.clone(),
            status_code: self.status_code(),
            status: status.map(str::to_owned),
        })
    }
}

/// Output of the classification step.
///
/// `context_status` is the label the failing call's context should carry from
/// now on (set for validation failures only). Callers that keep request-scoped
/// diagnostics read it from here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub error: AppError,
    pub context_status: Option<&'static str>,
}

pub fn classify(err: DownstreamError) -> Classified {
    match err.kind {
        Some(DownstreamErrorKind::Validation) => {
            // a validation failure without violations still needs a message
            let message = err
                .data
                .first()
                .map(|violation| violation.message.clone())
                .unwrap_or(err.message);

            Classified {
                error: AppError::Validation {
                    violations: err.data,
                    message,
                },
                context_status: Some(VALIDATION_STATUS),
            }
        }
        Some(DownstreamErrorKind::Other) | None => {
            let status_code = err
                .meta
                .status_code
                .filter(|code| *code != 0 && StatusCode::from_u16(*code).is_ok())
                .unwrap_or(500);

            let label = err
                .meta
                .status
                .filter(|label| !label.is_empty())
                .or_else(|| status_label(status_code).map(str::to_owned));

            Classified {
                error: AppError::Downstream {
                    status_code,
                    status_label: label,
                    message: err.message,
                },
                context_status: None,
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if let Some(envelope) = self.envelope() {
            return (status, Json(envelope)).into_response();
        }

        match self {
            AppError::AuthRejected { message } => (
                status,
                Json(AuthRejectedBody {
                    code: 403,
                    error: RejectionMessage { message: &message },
                }),
            )
                .into_response(),
            _ => (
                status,
                Json(AuthMissingBody {
                    code: 401,
                    error: INVALID_TOKEN_MESSAGE,
                }),
            )
                .into_response(),
        }
    }
}

impl From<DownstreamError> for AppError {
    fn from(e: DownstreamError) -> Self {
        classify(e).error
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        // Client sent a body the JSON parser refused (syntax, content-type, shape)
        AppError::downstream(e.status().as_u16(), e.body_text())
    }
}
