//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::speech::DEFAULT_SPEAKER;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 音频后处理配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 母带处理（ffmpeg）配置
    #[serde(default)]
    pub mastering: MasteringConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 临时文件清理配置
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 推理后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsBackend {
    /// 上游 HTTP 推理服务
    #[default]
    Http,
    /// 本地正弦音生成器（开发/测试）
    Fake,
}

impl std::fmt::Display for TtsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TtsBackend::Http => write!(f, "http"),
            TtsBackend::Fake => write!(f, "fake"),
        }
    }
}

/// TTS 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub backend: TtsBackend,

    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 英语模型
    #[serde(default = "default_model")]
    pub model: String,

    /// 非英语语言使用的模型
    #[serde(default)]
    pub multilingual_model: Option<String>,

    /// /models 展示的可用模型列表
    #[serde(default)]
    pub models: Vec<String>,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 最大重试次数
    #[serde(default)]
    pub max_retries: u32,

    /// 启动时预热引擎
    #[serde(default = "default_preload")]
    pub preload: bool,

    /// 内置说话人列表
    #[serde(default = "default_speakers")]
    pub speakers: Vec<String>,
}

fn default_tts_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_model() -> String {
    "tts_models/multilingual/multi-dataset/xtts_v2".to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

fn default_preload() -> bool {
    true
}

fn default_speakers() -> Vec<String> {
    [DEFAULT_SPEAKER, "Daisy Studious", "Gracie Wise", "Andrew Chipper", "Craig Gutsy"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            backend: TtsBackend::default(),
            url: default_tts_url(),
            model: default_model(),
            multilingual_model: None,
            models: Vec::new(),
            timeout_secs: default_tts_timeout(),
            max_retries: 0,
            preload: default_preload(),
            speakers: default_speakers(),
        }
    }
}

impl TtsConfig {
    /// 已配置的全部模型（去重，保持顺序）
    pub fn available_models(&self) -> Vec<String> {
        let mut models = vec![self.model.clone()];
        models.extend(self.multilingual_model.iter().cloned());
        models.extend(self.models.iter().cloned());
        let mut seen = std::collections::HashSet::new();
        models.retain(|m| seen.insert(m.clone()));
        models
    }
}

/// 音频后处理配置
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// 输出采样率（母带处理重采样目标）
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// 默认是否母带处理
    #[serde(default)]
    pub mastering_enabled: bool,

    /// 请求未指定时的降噪强度
    #[serde(default = "default_denoiser_strength")]
    pub default_denoiser_strength: f32,
}

fn default_sample_rate() -> u32 {
    22050
}

fn default_denoiser_strength() -> f32 {
    0.02
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            mastering_enabled: false,
            default_denoiser_strength: default_denoiser_strength(),
        }
    }
}

/// 母带处理配置
#[derive(Debug, Clone, Deserialize)]
pub struct MasteringConfig {
    /// 额外的 ffmpeg 候选路径
    #[serde(default)]
    pub ffmpeg_paths: Vec<PathBuf>,

    /// 外部进程超时（秒）
    #[serde(default = "default_mastering_timeout")]
    pub timeout_secs: u64,
}

fn default_mastering_timeout() -> u64 {
    10
}

impl Default for MasteringConfig {
    fn default() -> Self {
        Self {
            ffmpeg_paths: Vec::new(),
            timeout_secs: default_mastering_timeout(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 参考音频存储目录
    #[serde(default = "default_voices_dir")]
    pub voices_dir: PathBuf,

    /// 请求级临时文件目录
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// 请求体最大大小（字节），默认 50MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_voices_dir() -> PathBuf {
    PathBuf::from("uploads/voices")
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("data/scratch")
}

fn default_max_upload_size() -> u64 {
    50 * 1024 * 1024 // 50 MB
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            voices_dir: default_voices_dir(),
            scratch_dir: default_scratch_dir(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

/// 临时文件清理配置
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// 是否启用后台定时清理（/cleanup 接口始终可用）
    #[serde(default)]
    pub enabled: bool,

    /// 清理间隔（秒）
    #[serde(default = "default_cleanup_interval")]
    pub interval_secs: u64,

    /// 文件最大保留时间（秒）
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
}

fn default_cleanup_interval() -> u64 {
    3600 // 1 小时
}

fn default_max_age() -> u64 {
    3600 // 1 小时
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_cleanup_interval(),
            max_age_secs: default_max_age(),
        }
    }
}

impl CleanupConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别（EnvFilter 语法）
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info,hearo_tts=info,tower_http=debug".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
