//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::VoiceSource;
use crate::domain::speech::{GenerationParams, SpeechError, VoiceFileName};

// ============================================================================
// Generation DTOs
// ============================================================================

/// `/generate` 请求体；multipart 与 `/runsync` 请求也先转换为该结构
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    pub text: Option<String>,
    /// 已上传参考音频的文件名（仅取文件名部分）
    #[serde(default, alias = "audio_prompt_path")]
    pub voice_id: Option<String>,
    #[serde(default, alias = "language_id")]
    pub language: Option<String>,
    pub speaker: Option<String>,
    pub exaggeration: Option<f32>,
    pub cfg_weight: Option<f32>,
    pub temperature: Option<f32>,
    pub speed: Option<f32>,
    pub denoiser_strength: Option<f32>,
    pub output_format: Option<String>,
    pub master: Option<bool>,
}

impl GenerateRequest {
    /// 合并默认值，生成待校验的合成参数
    pub fn params(&self, default_denoiser_strength: f32) -> Result<GenerationParams, SpeechError> {
        let base = GenerationParams::default();
        let output_format = match non_blank(&self.output_format) {
            Some(f) => f.parse()?,
            None => base.output_format,
        };

        Ok(GenerationParams {
            language: non_blank(&self.language)
                .map(str::to_lowercase)
                .unwrap_or(base.language),
            speaker: non_blank(&self.speaker)
                .map(str::to_string)
                .unwrap_or(base.speaker),
            exaggeration: self.exaggeration.unwrap_or(base.exaggeration),
            cfg_weight: self.cfg_weight.unwrap_or(base.cfg_weight),
            temperature: self.temperature.unwrap_or(base.temperature),
            speed: self.speed.unwrap_or(base.speed),
            denoiser_strength: self.denoiser_strength.unwrap_or(default_denoiser_strength),
            output_format,
            master: self.master,
        })
    }

    /// 由 `voice_id` 决定音色来源
    pub fn voice_source(&self) -> Result<VoiceSource, SpeechError> {
        match non_blank(&self.voice_id) {
            Some(id) => Ok(VoiceSource::Stored(VoiceFileName::parse(id)?)),
            None => Ok(VoiceSource::BuiltIn),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ============================================================================
// Serverless DTOs
// ============================================================================

/// `/runsync` 事件
#[derive(Debug, Deserialize)]
pub struct RunSyncEvent {
    #[serde(default)]
    pub input: RunSyncInput,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunSyncInput {
    pub text: Option<String>,
    /// base64 编码的参考音频
    pub voice_file_base64: Option<String>,
    pub language: Option<String>,
    pub speaker: Option<String>,
    pub speed: Option<f32>,
    pub temperature: Option<f32>,
    pub exaggeration: Option<f32>,
    pub cfg_weight: Option<f32>,
    pub denoiser_strength: Option<f32>,
}

/// 事件接口默认语速
const RUNSYNC_DEFAULT_SPEED: f32 = 1.0;

impl RunSyncInput {
    pub fn to_request(&self) -> GenerateRequest {
        GenerateRequest {
            text: self.text.clone(),
            voice_id: None,
            language: self.language.clone(),
            speaker: self.speaker.clone(),
            exaggeration: self.exaggeration,
            cfg_weight: self.cfg_weight,
            temperature: self.temperature,
            speed: Some(self.speed.unwrap_or(RUNSYNC_DEFAULT_SPEED)),
            denoiser_strength: self.denoiser_strength,
            output_format: None,
            master: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunSyncOutput {
    pub audio_base64: String,
    pub format: String,
    pub sample_rate: u32,
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct RunSyncHealth {
    pub status: &'static str,
    pub model_loaded: bool,
    pub model: String,
}

// ============================================================================
// Voice DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UploadVoiceResponse {
    pub success: bool,
    pub message: String,
    pub path: String,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::speech::OutputFormat;

    #[test]
    fn test_aliases() {
        let req: GenerateRequest = serde_json::from_str(
            r#"{"text":"hi","audio_prompt_path":"/tmp/voices/voice_1_a.wav","language_id":"FR"}"#,
        )
        .unwrap();
        let params = req.params(0.02).unwrap();
        assert_eq!(params.language, "fr");
        match req.voice_source().unwrap() {
            VoiceSource::Stored(name) => assert_eq!(name.as_str(), "voice_1_a.wav"),
            other => panic!("unexpected voice source: {:?}", other),
        }
    }

    #[test]
    fn test_defaults_applied() {
        let req = GenerateRequest {
            text: Some("hi".to_string()),
            output_format: Some("mp3".to_string()),
            ..Default::default()
        };
        let params = req.params(0.1).unwrap();
        assert_eq!(params.denoiser_strength, 0.1);
        assert_eq!(params.output_format, OutputFormat::Mp3);
        assert_eq!(params.speed, 0.92);
        assert!(matches!(req.voice_source().unwrap(), VoiceSource::BuiltIn));
    }

    #[test]
    fn test_runsync_speed_default() {
        let event: RunSyncEvent = serde_json::from_str(r#"{"input":{"text":"hello"}}"#).unwrap();
        let params = event.input.to_request().params(0.0).unwrap();
        assert_eq!(params.speed, 1.0);
    }
}
