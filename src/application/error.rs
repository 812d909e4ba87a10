//! 应用层错误定义
//!
//! 统一的命令/查询错误类型，HTTP 层按变体映射状态码

use thiserror::Error;

use crate::application::ports::{ScratchError, TtsError, VoiceStoreError};
use crate::domain::speech::SpeechError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 请求参数错误
    #[error("{0}")]
    Validation(String),

    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 引擎尚未就绪
    #[error("{0}")]
    NotReady(String),

    /// 上游推理服务错误
    #[error("TTS generation failed: {0}")]
    Upstream(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<SpeechError> for ApplicationError {
    fn from(err: SpeechError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<TtsError> for ApplicationError {
    fn from(err: TtsError) -> Self {
        match err {
            TtsError::NotReady(msg) => Self::NotReady(msg),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl From<VoiceStoreError> for ApplicationError {
    fn from(err: VoiceStoreError) -> Self {
        match err {
            VoiceStoreError::InvalidName(e) => Self::Validation(e.to_string()),
            VoiceStoreError::Io(msg) => Self::Internal(msg),
        }
    }
}

impl From<ScratchError> for ApplicationError {
    fn from(err: ScratchError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<std::io::Error> for ApplicationError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
