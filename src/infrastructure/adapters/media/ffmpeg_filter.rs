//! FFmpeg Media Filter - 母带处理与 MP3 编码
//!
//! 母带滤镜链：高通 120Hz、4.5kHz 提升、轻度压缩、响度归一化 (-16 LUFS)。
//! 输出写入 `<path>.mastered.wav`，成功后重命名覆盖原文件；
//! 失败或超时删除临时文件，原文件保持不变。

use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::application::ports::{MediaFilterError, MediaFilterPort};

pub const MASTERING_FILTER: &str = "highpass=f=120,\
equalizer=f=4500:t=q:w=2:g=3,\
acompressor=threshold=-20dB:ratio=1.5:attack=5:release=50,\
loudnorm=I=-16:TP=-1.5:LRA=11";

/// FFmpeg 配置
#[derive(Debug, Clone)]
pub struct FfmpegConfig {
    /// 额外的候选路径（在 PATH 查找之前尝试）
    pub extra_paths: Vec<PathBuf>,
    pub timeout: Duration,
    /// 母带输出采样率
    pub sample_rate: u32,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            extra_paths: Vec::new(),
            timeout: Duration::from_secs(10),
            sample_rate: 22050,
        }
    }
}

/// 按顺序查找 ffmpeg：conda 环境、配置路径、PATH
pub fn locate_ffmpeg(
    conda_prefix: Option<&OsStr>,
    extra_paths: &[PathBuf],
    path_var: Option<&OsStr>,
) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(prefix) = conda_prefix {
        let prefix = Path::new(prefix);
        candidates.push(prefix.join("Library").join("bin").join("ffmpeg.exe"));
        candidates.push(prefix.join("bin").join("ffmpeg"));
    }
    candidates.extend(extra_paths.iter().cloned());

    if let Some(found) = candidates.into_iter().find(|c| c.is_file()) {
        return Some(found);
    }

    let binary = if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" };
    path_var.and_then(|paths| {
        std::env::split_paths(paths)
            .map(|dir| dir.join(binary))
            .find(|c| c.is_file())
    })
}

fn mastered_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".mastered.wav");
    PathBuf::from(name)
}

/// FFmpeg Media Filter
#[derive(Debug, Clone)]
pub struct FfmpegMediaFilter {
    binary: Option<PathBuf>,
    config: FfmpegConfig,
}

impl FfmpegMediaFilter {
    /// 使用当前进程环境查找 ffmpeg
    pub fn locate(config: FfmpegConfig) -> Self {
        let binary = locate_ffmpeg(
            std::env::var_os("CONDA_PREFIX").as_deref(),
            &config.extra_paths,
            std::env::var_os("PATH").as_deref(),
        );
        match &binary {
            Some(path) => tracing::info!(ffmpeg = %path.display(), "ffmpeg located"),
            None => tracing::warn!("ffmpeg not found, mastering and MP3 output disabled"),
        }
        Self { binary, config }
    }

    pub fn with_binary(binary: Option<PathBuf>, config: FfmpegConfig) -> Self {
        Self { binary, config }
    }

    async fn run(&self, args: Vec<OsString>, output: &Path) -> Result<(), MediaFilterError> {
        let binary = self.binary.as_ref().ok_or(MediaFilterError::ToolNotFound)?;

        let child = Command::new(binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MediaFilterError::ProcessFailed(format!("failed to run ffmpeg: {}", e)))?;

        let result = tokio::time::timeout(self.config.timeout, child.wait_with_output()).await;

        let failure = match result {
            Ok(Ok(out)) if out.status.success() => return Ok(()),
            Ok(Ok(out)) => MediaFilterError::ProcessFailed(format!(
                "exit {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )),
            Ok(Err(e)) => MediaFilterError::Io(e.to_string()),
            Err(_) => MediaFilterError::Timeout(self.config.timeout.as_secs()),
        };

        let _ = tokio::fs::remove_file(output).await;
        Err(failure)
    }
}

#[async_trait]
impl MediaFilterPort for FfmpegMediaFilter {
    async fn master(&self, path: &Path) -> Result<(), MediaFilterError> {
        let temp = mastered_path(path);
        let args: Vec<OsString> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            path.into(),
            "-af".into(),
            MASTERING_FILTER.into(),
            "-ar".into(),
            self.config.sample_rate.to_string().into(),
            temp.clone().into(),
        ];

        self.run(args, &temp).await?;

        if let Err(e) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(MediaFilterError::Io(e.to_string()));
        }

        tracing::debug!(path = %path.display(), "Mastering applied");
        Ok(())
    }

    async fn encode_mp3(&self, wav: &Path, mp3: &Path) -> Result<(), MediaFilterError> {
        let args: Vec<OsString> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            wav.into(),
            "-codec:a".into(),
            "libmp3lame".into(),
            "-q:a".into(),
            "2".into(),
            mp3.into(),
        ];
        self.run(args, mp3).await
    }

    fn is_available(&self) -> bool {
        self.binary.is_some()
    }
}
