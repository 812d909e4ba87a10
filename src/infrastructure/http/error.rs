//! HTTP Error Handling
//!
//! 错误响应统一为 `{"error": "<message>"}`，状态码按错误类型区分

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;
use crate::domain::speech::SpeechError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    ServiceUnavailable(String),
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::BadRequest(msg) => tracing::warn!(status = status.as_u16(), error = %msg, "Bad request"),
            ApiError::NotFound(msg) => tracing::warn!(status = status.as_u16(), error = %msg, "Resource not found"),
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!(status = status.as_u16(), error = %msg, "Service unavailable")
            }
            ApiError::BadGateway(msg) => tracing::error!(status = status.as_u16(), error = %msg, "Upstream failure"),
            ApiError::Internal(msg) => tracing::error!(status = status.as_u16(), error = %msg, "Internal server error"),
        }

        (status, Json(ErrorResponse::new(self.message()))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::Validation(msg) => ApiError::BadRequest(msg),
            e @ ApplicationError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ApplicationError::NotReady(msg) => ApiError::ServiceUnavailable(msg),
            e @ ApplicationError::Upstream(_) => ApiError::BadGateway(e.to_string()),
            ApplicationError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<SpeechError> for ApiError {
    fn from(e: SpeechError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

/// 请求体无法解析或字段类型不符，统一按参数错误返回
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
