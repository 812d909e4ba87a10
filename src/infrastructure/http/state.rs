//! Application State
//!
//! 包含所有 Command/Query Handlers 及引擎引用

use std::sync::Arc;
use std::time::Duration;

use crate::application::{
    // Command handlers
    CleanupScratchHandler, GenerateSpeechHandler, UploadVoiceHandler,
    // Query handlers
    ListVoicesHandler,
    // Ports
    TtsEnginePort,
};
use crate::domain::speech::DEFAULT_SPEAKER;

/// 服务描述信息（/、/info、/models 使用）
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub service: String,
    /// 推理后端名称（http / fake）
    pub backend: String,
    /// 配置的模型列表
    pub models: Vec<String>,
    /// 内置说话人
    pub speakers: Vec<String>,
    /// ffmpeg 是否可用
    pub mastering_available: bool,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "hearo-tts".to_string(),
            backend: "fake".to_string(),
            models: Vec::new(),
            speakers: vec![DEFAULT_SPEAKER.to_string()],
            mastering_available: false,
        }
    }
}

/// 请求未指定参数时使用的默认值
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    pub denoiser_strength: f32,
    /// /cleanup 的文件最大保留时间
    pub cleanup_max_age: Duration,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            denoiser_strength: 0.02,
            cleanup_max_age: Duration::from_secs(3600),
        }
    }
}

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub tts_engine: Arc<dyn TtsEnginePort>,

    // ========== Command Handlers ==========
    pub generate_speech_handler: GenerateSpeechHandler,
    pub upload_voice_handler: UploadVoiceHandler,
    pub cleanup_handler: Arc<CleanupScratchHandler>,

    // ========== Query Handlers ==========
    pub list_voices_handler: ListVoicesHandler,

    pub info: ServiceInfo,
    pub defaults: RequestDefaults,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        tts_engine: Arc<dyn TtsEnginePort>,
        generate_speech_handler: GenerateSpeechHandler,
        upload_voice_handler: UploadVoiceHandler,
        cleanup_handler: Arc<CleanupScratchHandler>,
        list_voices_handler: ListVoicesHandler,
        info: ServiceInfo,
        defaults: RequestDefaults,
    ) -> Self {
        Self {
            tts_engine,
            generate_speech_handler,
            upload_voice_handler,
            cleanup_handler,
            list_voices_handler,
            info,
            defaults,
        }
    }
}
