//! File Voice Store - 文件系统参考音频存储
//!
//! 实现 VoiceStorePort trait

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{StoredVoice, VoiceStoreError, VoiceStorePort};
use crate::domain::speech::{audio_extension, VoiceFileName};

fn io_err(e: std::io::Error) -> VoiceStoreError {
    VoiceStoreError::Io(e.to_string())
}

/// 文件系统参考音频存储
pub struct FileVoiceStore {
    base_dir: PathBuf,
}

impl FileVoiceStore {
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, VoiceStoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await.map_err(io_err)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[async_trait]
impl VoiceStorePort for FileVoiceStore {
    async fn save(&self, original_name: &str, data: &[u8]) -> Result<StoredVoice, VoiceStoreError> {
        let name = VoiceFileName::for_upload(original_name, Utc::now().timestamp())?;
        let path = self.base_dir.join(name.as_str());

        fs::write(&path, data).await.map_err(io_err)?;

        tracing::debug!(path = %path.display(), size = data.len(), "Saved voice reference");

        Ok(StoredVoice {
            file_name: name.to_string(),
            path,
            size: data.len() as u64,
        })
    }

    async fn list(&self) -> Result<Vec<String>, VoiceStoreError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.base_dir).await.map_err(io_err)?;

        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if audio_extension(name).is_some() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn resolve(&self, name: &VoiceFileName) -> Result<Option<PathBuf>, VoiceStoreError> {
        let path = self.base_dir.join(name.as_str());
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(path)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = FileVoiceStore::new(dir.path().join("voices")).await.unwrap();

        let stored = store.save("Narrator Take 2.wav", b"wav bytes").await.unwrap();
        assert!(stored.file_name.starts_with("voice_"));
        assert!(stored.file_name.ends_with("_Narrator_Take_2.wav"));
        assert_eq!(stored.size, 9);

        let name = VoiceFileName::parse(&stored.file_name).unwrap();
        assert_eq!(store.load(&name).await.unwrap(), Some(b"wav bytes".to_vec()));
    }

    #[tokio::test]
    async fn test_rejects_unsupported_extension() {
        let dir = tempdir().unwrap();
        let store = FileVoiceStore::new(dir.path()).await.unwrap();

        let err = store.save("notes.txt", b"hello").await.unwrap_err();
        assert!(matches!(err, VoiceStoreError::InvalidName(_)));
    }

    #[tokio::test]
    async fn test_list_only_audio_sorted() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.wav"), b"").unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("sub.wav")).unwrap();

        let store = FileVoiceStore::new(dir.path()).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["a.mp3", "b.wav"]);
    }

    #[tokio::test]
    async fn test_resolve_missing() {
        let dir = tempdir().unwrap();
        let store = FileVoiceStore::new(dir.path()).await.unwrap();
        let name = VoiceFileName::parse("ghost.wav").unwrap();

        assert_eq!(store.resolve(&name).await.unwrap(), None);
        assert_eq!(store.load(&name).await.unwrap(), None);
    }
}
