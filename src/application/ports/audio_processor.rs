//! Audio Processor Port - 本地音频后处理

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::domain::dsp::{DenoiseReport, DspError};

#[derive(Debug, Error)]
pub enum DenoiseError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Unsupported WAV: {0}")]
    Format(String),

    #[error(transparent)]
    Dsp(#[from] DspError),
}

/// Audio Processor Port
#[async_trait]
pub trait AudioProcessorPort: Send + Sync {
    /// 原地降噪 16 位 PCM WAV 文件
    ///
    /// strength 为 0 时直接返回 `Ok(None)`，不触碰文件；失败时原文件保持不变
    async fn denoise(&self, path: &Path, strength: f32) -> Result<Option<DenoiseReport>, DenoiseError>;
}
