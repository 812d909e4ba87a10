//! Speech Commands

use std::time::Duration;

use crate::domain::speech::{GenerationParams, OutputFormat, VoiceFileName};

/// 音色来源
#[derive(Debug, Clone, Default)]
pub enum VoiceSource {
    /// 内置说话人
    #[default]
    BuiltIn,
    /// 已上传的参考音频
    Stored(VoiceFileName),
    /// 随请求上传的参考音频
    Inline { name: String, data: Vec<u8> },
}

/// 合成语音命令
#[derive(Debug, Clone)]
pub struct GenerateSpeech {
    /// 原始文本（尚未校验）
    pub text: String,
    pub params: GenerationParams,
    pub voice: VoiceSource,
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct GeneratedSpeech {
    pub audio: Vec<u8>,
    /// 实际输出格式（MP3 编码失败时回退为 WAV）
    pub format: OutputFormat,
    pub sample_rate: u32,
    pub language: String,
    /// 模型推理耗时
    pub generation_time: Duration,
}
