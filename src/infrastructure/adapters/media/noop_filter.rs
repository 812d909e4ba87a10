//! No-op Media Filter - 无外部工具时的占位实现

use async_trait::async_trait;
use std::path::Path;

use crate::application::ports::{MediaFilterError, MediaFilterPort};

/// 不做任何处理；母带直接跳过，MP3 编码报告工具缺失
#[derive(Debug, Clone, Default)]
pub struct NoopMediaFilter;

#[async_trait]
impl MediaFilterPort for NoopMediaFilter {
    async fn master(&self, _path: &Path) -> Result<(), MediaFilterError> {
        Ok(())
    }

    async fn encode_mp3(&self, _wav: &Path, _mp3: &Path) -> Result<(), MediaFilterError> {
        Err(MediaFilterError::ToolNotFound)
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_master_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        std::fs::write(&path, b"data").unwrap();

        NoopMediaFilter.master(&path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"data");
        assert!(NoopMediaFilter.encode_mp3(&path, &dir.path().join("a.mp3")).await.is_err());
    }
}
