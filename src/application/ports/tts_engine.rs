//! TTS Engine Port - TTS 推理引擎抽象
//!
//! 神经网络推理不在本服务内执行，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// 引擎仍在加载
    #[error("Model is loading: {0}")]
    NotReady(String),
}

/// 克隆音色用的参考音频
#[derive(Debug, Clone)]
pub struct VoiceReference {
    pub name: String,
    pub data: Vec<u8>,
}

/// TTS 推理请求（文本已预处理，参数已校验）
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub language: String,
    /// 无参考音频时使用的内置说话人
    pub speaker: String,
    pub exaggeration: f32,
    pub cfg_weight: f32,
    pub temperature: f32,
    pub speed: f32,
    pub voice_ref: Option<VoiceReference>,
}

/// TTS 推理结果
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    /// WAV 字节
    pub audio_data: Vec<u8>,
    pub sample_rate: Option<u32>,
    pub duration_ms: Option<u64>,
}

/// TTS Engine Port
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 执行 TTS 推理，返回 WAV 音频
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisOutput, TtsError>;

    /// 检查上游服务是否可用
    async fn health_check(&self) -> bool {
        true
    }

    /// 引擎是否已完成初始化
    fn is_ready(&self) -> bool {
        true
    }

    /// 模型名称（用于 /health、/info）
    fn model_name(&self) -> String;
}
