//! HTTP Error Handling
//!
//! 失败类别 → HTTP 状态码：
//! - validation_error → 400
//! - engine_unavailable → 503
//! - resource_staging_error / engine_error / all_units_failed → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::{FailureKind, SynthesisError};

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
    ServiceUnavailable(String),
    Synthesis(SynthesisError),
}

fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::ValidationError => StatusCode::BAD_REQUEST,
        FailureKind::EngineUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        FailureKind::ResourceStagingError
        | FailureKind::EngineError
        | FailureKind::AllUnitsFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, response) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(errno = errno::BAD_REQUEST, error = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new(errno::BAD_REQUEST, msg),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(errno = errno::INTERNAL_ERROR, error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(errno::INTERNAL_ERROR, msg),
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(errno = errno::SERVICE_UNAVAILABLE, error = %msg, "Service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new(errno::SERVICE_UNAVAILABLE, msg),
                )
            }
            ApiError::Synthesis(err) => {
                let kind = err.kind();
                let status = status_for(kind);
                let code = status.as_u16() as i32;
                let message = format!("{}: {}", kind, err);

                if status.is_server_error() {
                    tracing::error!(errno = code, kind = %kind, error = %err, "Synthesis failed");
                } else {
                    tracing::warn!(errno = code, kind = %kind, error = %err, "Synthesis rejected");
                }

                let mut response = ErrorResponse::new(code, message);
                if let SynthesisError::AllUnitsFailed { failures, .. } = &err {
                    response = response.with_data(serde_json::json!({ "failures": failures }));
                }
                (status, response)
            }
        };

        (status, Json(response)).into_response()
    }
}

impl From<SynthesisError> for ApiError {
    fn from(e: SynthesisError) -> Self {
        ApiError::Synthesis(e)
    }
}
