//! Fake TTS Client - 用于开发与测试的 TTS 引擎
//!
//! 不调用上游服务，生成时长随文本长度变化的正弦音 WAV

use async_trait::async_trait;
use std::io::Cursor;
use std::time::Duration;

use crate::application::ports::{SynthesisOutput, SynthesisRequest, TtsEnginePort, TtsError};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    pub sample_rate: u32,
    /// 每个字符对应的时长（毫秒）
    pub ms_per_char: u64,
    pub min_duration_ms: u64,
    pub max_duration_ms: u64,
    /// 正弦音频率 (Hz)
    pub tone_hz: f32,
    /// 模拟推理延迟
    pub latency: Duration,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            ms_per_char: 60,
            min_duration_ms: 500,
            max_duration_ms: 30_000,
            tone_hz: 220.0,
            latency: Duration::ZERO,
        }
    }
}

/// Fake TTS Client
#[derive(Debug, Clone, Default)]
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            tone_hz = config.tone_hz,
            "FakeTtsClient initialized"
        );
        Self { config }
    }

    fn duration_ms(&self, text: &str) -> u64 {
        (text.chars().count() as u64 * self.config.ms_per_char)
            .clamp(self.config.min_duration_ms, self.config.max_duration_ms)
    }

    fn render(&self, duration_ms: u64) -> Result<Vec<u8>, hound::Error> {
        let rate = self.config.sample_rate;
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let samples = (rate as u64 * duration_ms / 1000) as usize;

        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        let step = 2.0 * std::f32::consts::PI * self.config.tone_hz / rate as f32;
        for i in 0..samples {
            let value = (i as f32 * step).sin() * 0.5;
            writer.write_sample((value * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisOutput, TtsError> {
        let duration_ms = self.duration_ms(&request.text);

        tracing::debug!(
            text_len = request.text.len(),
            language = %request.language,
            duration_ms,
            "FakeTtsClient: rendering tone"
        );

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        let audio_data = self
            .render(duration_ms)
            .map_err(|e| TtsError::InvalidResponse(e.to_string()))?;

        Ok(SynthesisOutput {
            audio_data,
            sample_rate: Some(self.config.sample_rate),
            duration_ms: Some(duration_ms),
        })
    }

    fn model_name(&self) -> String {
        "fake-tone".to_string()
    }
}
