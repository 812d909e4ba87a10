//! Scratch Storage Port - 请求级临时文件与过期清理

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tempfile::TempPath;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScratchError {
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ScratchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// 临时文件，离开作用域时删除（成功与失败路径一致）
#[derive(Debug)]
pub struct ScratchFile {
    path: TempPath,
}

impl ScratchFile {
    pub fn new(path: TempPath) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// GC 结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GcResult {
    /// 删除的文件数量
    pub deleted_files: u64,
    /// 释放的空间（字节）
    pub freed_bytes: u64,
}

/// Scratch Storage Port
#[async_trait]
pub trait ScratchStoragePort: Send + Sync {
    /// 在临时目录中创建唯一命名的空文件：`{prefix}*.{extension}`
    async fn create_file(&self, prefix: &str, extension: &str) -> Result<ScratchFile, ScratchError>;

    /// 删除修改时间早于 `max_age` 的 wav/mp3 文件
    async fn gc(&self, max_age: Duration) -> Result<GcResult, ScratchError>;
}
