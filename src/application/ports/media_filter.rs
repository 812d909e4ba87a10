//! Media Filter Port - 外部音频滤镜
//!
//! 母带处理（压缩、EQ、响度归一化）与 MP3 编码

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaFilterError {
    #[error("Media tool not found")]
    ToolNotFound,

    #[error("Media tool failed: {0}")]
    ProcessFailed(String),

    #[error("Media tool timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(String),
}

/// Media Filter Port
///
/// 失败时必须保证输入文件不变
#[async_trait]
pub trait MediaFilterPort: Send + Sync {
    /// 原地母带处理 WAV 文件
    async fn master(&self, path: &Path) -> Result<(), MediaFilterError>;

    /// WAV -> MP3
    async fn encode_mp3(&self, wav: &Path, mp3: &Path) -> Result<(), MediaFilterError>;

    /// 是否具备实际处理能力（/info 展示）
    fn is_available(&self) -> bool;
}
