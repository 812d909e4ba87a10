//! Speech Context - 合成参数值对象
//!
//! 不变量：
//! - 文本非空（去除空白后）
//! - 数值参数必须落在文档范围内，否则在调用模型前拒绝

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;

/// 默认内置说话人
pub const DEFAULT_SPEAKER: &str = "Claribel Dervla";

/// 默认语言
pub const DEFAULT_LANGUAGE: &str = "en";

/// 支持的语言代码
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "ar", "cs", "da", "de", "el", "en", "es", "fi", "fr", "he", "hi", "hu", "it", "ja", "ko",
    "ms", "nl", "no", "pl", "pt", "ru", "sv", "sw", "tr", "zh", "zh-cn",
];

/// 允许的参考音频扩展名
pub const VOICE_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg"];

pub const EXAGGERATION_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const CFG_WEIGHT_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const SPEED_RANGE: RangeInclusive<f32> = 0.5..=2.0;
pub const DENOISER_RANGE: RangeInclusive<f32> = 0.0..=1.0;

/// 参数校验错误
#[derive(Debug, Error, PartialEq)]
pub enum SpeechError {
    #[error("Text is required")]
    MissingText,

    #[error("{name} must be between {min} and {max}")]
    OutOfRange {
        name: &'static str,
        min: f32,
        max: f32,
    },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Invalid voice file name: {0}")]
    InvalidVoiceName(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// 输出音频格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Wav,
    Mp3,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Mp3 => "mp3",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "audio/wav",
            OutputFormat::Mp3 => "audio/mpeg",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = SpeechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wav" => Ok(OutputFormat::Wav),
            "mp3" => Ok(OutputFormat::Mp3),
            _ => Err(SpeechError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// 合成参数
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub language: String,
    pub speaker: String,
    /// 情绪夸张程度
    pub exaggeration: f32,
    /// classifier-free guidance 权重
    pub cfg_weight: f32,
    pub temperature: f32,
    pub speed: f32,
    /// 降噪强度，0 表示不降噪
    pub denoiser_strength: f32,
    pub output_format: OutputFormat,
    /// 覆盖配置中的母带处理开关
    pub master: Option<bool>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            speaker: DEFAULT_SPEAKER.to_string(),
            exaggeration: 0.5,
            cfg_weight: 0.5,
            temperature: 0.5,
            speed: 0.92,
            denoiser_strength: 0.02,
            output_format: OutputFormat::Wav,
            master: None,
        }
    }
}

fn check_range(name: &'static str, value: f32, range: &RangeInclusive<f32>) -> Result<(), SpeechError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(SpeechError::OutOfRange {
            name,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

impl GenerationParams {
    pub fn validate(&self) -> Result<(), SpeechError> {
        check_range("exaggeration", self.exaggeration, &EXAGGERATION_RANGE)?;
        check_range("cfg_weight", self.cfg_weight, &CFG_WEIGHT_RANGE)?;
        check_range("temperature", self.temperature, &TEMPERATURE_RANGE)?;
        check_range("speed", self.speed, &SPEED_RANGE)?;
        check_range("denoiser_strength", self.denoiser_strength, &DENOISER_RANGE)?;

        if !is_supported_language(&self.language) {
            return Err(SpeechError::UnsupportedLanguage(self.language.clone()));
        }
        Ok(())
    }

    pub fn is_english(&self) -> bool {
        self.language.eq_ignore_ascii_case("en")
    }
}

pub fn is_supported_language(code: &str) -> bool {
    let code = code.to_lowercase();
    SUPPORTED_LANGUAGES.contains(&code.as_str())
}

/// 校验合成文本，返回去除首尾空白后的内容
pub fn require_text(text: Option<&str>) -> Result<&str, SpeechError> {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(SpeechError::MissingText),
    }
}

/// 参考音频文件名
///
/// 不变量：单一路径分量，不含目录穿越，扩展名属于 [`VOICE_EXTENSIONS`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceFileName(String);

impl VoiceFileName {
    /// 解析客户端给出的音色标识；允许传入完整路径，只取文件名部分
    pub fn parse(raw: &str) -> Result<Self, SpeechError> {
        let name = Path::new(raw.trim())
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SpeechError::InvalidVoiceName(raw.to_string()))?;

        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(SpeechError::InvalidVoiceName(raw.to_string()));
        }
        if audio_extension(name).is_none() {
            return Err(SpeechError::InvalidVoiceName(raw.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    /// 为上传的参考音频生成存储文件名
    ///
    /// 格式：`voice_{unix 秒}_{清洗后的原文件名}`
    pub fn for_upload(original_name: &str, unix_secs: i64) -> Result<Self, SpeechError> {
        let base = Path::new(original_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if audio_extension(base).is_none() {
            return Err(SpeechError::InvalidVoiceName(format!(
                "{} (allowed: {})",
                original_name,
                VOICE_EXTENSIONS.join(", ")
            )));
        }

        let sanitized: String = base
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        Self::parse(&format!("voice_{}_{}", unix_secs, sanitized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn extension(&self) -> &str {
        audio_extension(&self.0).unwrap_or("wav")
    }
}

impl std::fmt::Display for VoiceFileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 返回受支持的音频扩展名（小写比较）
pub fn audio_extension(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
    VOICE_EXTENSIONS.iter().copied().find(|e| *e == ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        assert!(GenerationParams::default().validate().is_ok());
    }

    #[test]
    fn test_exaggeration_out_of_range() {
        let params = GenerationParams {
            exaggeration: 1.5,
            ..Default::default()
        };
        assert_eq!(
            params.validate(),
            Err(SpeechError::OutOfRange {
                name: "exaggeration",
                min: 0.0,
                max: 1.0
            })
        );
        assert_eq!(
            params.validate().unwrap_err().to_string(),
            "exaggeration must be between 0 and 1"
        );
    }

    #[test]
    fn test_cfg_weight_negative() {
        let params = GenerationParams {
            cfg_weight: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(SpeechError::OutOfRange { name: "cfg_weight", .. })
        ));
    }

    #[test]
    fn test_boundaries_accepted() {
        let params = GenerationParams {
            exaggeration: 0.0,
            cfg_weight: 1.0,
            denoiser_strength: 0.0,
            speed: 2.0,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_unsupported_language() {
        let params = GenerationParams {
            language: "xx".to_string(),
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(SpeechError::UnsupportedLanguage(_))));
        assert!(is_supported_language("ZH-CN"));
    }

    #[test]
    fn test_require_text() {
        assert_eq!(require_text(Some("  hi ")), Ok("hi"));
        assert_eq!(require_text(Some("   ")), Err(SpeechError::MissingText));
        assert_eq!(require_text(None), Err(SpeechError::MissingText));
    }

    #[test]
    fn test_voice_file_name_strips_directories() {
        let name = VoiceFileName::parse("/srv/voices/voice_1_narrator.wav").unwrap();
        assert_eq!(name.as_str(), "voice_1_narrator.wav");
        assert!(VoiceFileName::parse("../").is_err());
        assert!(VoiceFileName::parse(".hidden.wav").is_err());
        assert!(VoiceFileName::parse("notes.txt").is_err());
    }

    #[test]
    fn test_voice_file_name_for_upload() {
        let name = VoiceFileName::for_upload("my voice (1).WAV", 1700000000).unwrap();
        assert_eq!(name.as_str(), "voice_1700000000_my_voice__1_.WAV");
        assert_eq!(name.extension(), "wav");
        assert!(VoiceFileName::for_upload("script.sh", 1).is_err());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("MP3".parse::<OutputFormat>(), Ok(OutputFormat::Mp3));
        assert!("ogg".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Wav.content_type(), "audio/wav");
    }
}
