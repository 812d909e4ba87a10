//! Voice Store Port - 参考音频存储

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::speech::{SpeechError, VoiceFileName};

#[derive(Debug, Error)]
pub enum VoiceStoreError {
    #[error(transparent)]
    InvalidName(#[from] SpeechError),

    #[error("IO error: {0}")]
    Io(String),
}

/// 已保存的参考音频
#[derive(Debug, Clone, Serialize)]
pub struct StoredVoice {
    pub file_name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Voice Store Port
#[async_trait]
pub trait VoiceStorePort: Send + Sync {
    /// 保存上传的参考音频，文件名按 `voice_{unix}_{原名}` 生成
    async fn save(&self, original_name: &str, data: &[u8]) -> Result<StoredVoice, VoiceStoreError>;

    /// 已存储的音频文件名（排序）
    async fn list(&self) -> Result<Vec<String>, VoiceStoreError>;

    /// 解析为存储目录内的路径，文件不存在时返回 None
    async fn resolve(&self, name: &VoiceFileName) -> Result<Option<PathBuf>, VoiceStoreError>;

    /// 读取参考音频内容
    async fn load(&self, name: &VoiceFileName) -> Result<Option<Vec<u8>>, VoiceStoreError> {
        match self.resolve(name).await? {
            Some(path) => tokio::fs::read(&path)
                .await
                .map(Some)
                .map_err(|e| VoiceStoreError::Io(e.to_string())),
            None => Ok(None),
        }
    }
}
