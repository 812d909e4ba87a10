//! File Scratch Storage - 请求级临时文件
//!
//! 实现 ScratchStoragePort：唯一命名的临时文件 + 按修改时间清理

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;

use crate::application::ports::{GcResult, ScratchError, ScratchFile, ScratchStoragePort};

/// GC 清理的文件扩展名
const GC_EXTENSIONS: &[&str] = &["wav", "mp3"];

/// 文件系统临时存储
pub struct FileScratchStorage {
    base_dir: PathBuf,
}

impl FileScratchStorage {
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, ScratchError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[async_trait]
impl ScratchStoragePort for FileScratchStorage {
    async fn create_file(&self, prefix: &str, extension: &str) -> Result<ScratchFile, ScratchError> {
        let dir = self.base_dir.clone();
        let prefix = prefix.to_string();
        let suffix = format!(".{}", extension);

        let temp = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(&suffix)
                .tempfile_in(&dir)
        })
        .await
        .map_err(|e| ScratchError::Io(e.to_string()))??;

        Ok(ScratchFile::new(temp.into_temp_path()))
    }

    async fn gc(&self, max_age: Duration) -> Result<GcResult, ScratchError> {
        let mut result = GcResult::default();
        let now = SystemTime::now();
        let mut entries = fs::read_dir(&self.base_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let matches_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| GC_EXTENSIONS.contains(&e));
            if !matches_ext {
                continue;
            }

            let meta = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let age = meta
                .modified()
                .ok()
                .and_then(|m| now.duration_since(m).ok())
                .unwrap_or_default();
            if age <= max_age {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    result.deleted_files += 1;
                    result.freed_bytes += meta.len();
                    tracing::debug!(path = %path.display(), age_secs = age.as_secs(), "Removed stale scratch file");
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove scratch file"),
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn age_file(path: &Path, age: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[tokio::test]
    async fn test_scratch_file_removed_on_drop() {
        let dir = tempdir().unwrap();
        let storage = FileScratchStorage::new(dir.path()).await.unwrap();

        let file = storage.create_file("output_", "wav").await.unwrap();
        let path = file.path().to_path_buf();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("output_") && name.ends_with(".wav"));
        assert!(path.exists());

        drop(file);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_gc_removes_only_stale_audio() {
        let dir = tempdir().unwrap();
        let storage = FileScratchStorage::new(dir.path()).await.unwrap();

        let stale = dir.path().join("output_old.wav");
        let fresh = dir.path().join("output_new.wav");
        let other = dir.path().join("notes.txt");
        std::fs::write(&stale, vec![0u8; 100]).unwrap();
        std::fs::write(&fresh, vec![0u8; 50]).unwrap();
        std::fs::write(&other, b"keep").unwrap();
        age_file(&stale, Duration::from_secs(3700));
        age_file(&fresh, Duration::from_secs(10));
        age_file(&other, Duration::from_secs(7200));

        let result = storage.gc(Duration::from_secs(3600)).await.unwrap();
        assert_eq!(
            result,
            GcResult {
                deleted_files: 1,
                freed_bytes: 100
            }
        );
        assert!(!stale.exists());
        assert!(fresh.exists());
        assert!(other.exists());
    }
}
