//! HTTP TTS Client - 调用上游推理服务
//!
//! 实现 TtsEnginePort trait
//!
//! 上游 TTS API:
//! POST {base_url}/api/tts/generate
//! Request: {"text", "language", "speaker", "model", "exaggeration", ...} (JSON)
//! Response: audio/wav binary, metadata in headers

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{SynthesisOutput, SynthesisRequest, TtsEnginePort, TtsError};

/// TTS 推理请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    language: &'a str,
    speaker: &'a str,
    model: &'a str,
    exaggeration: f32,
    cfg_weight: f32,
    temperature: f32,
    speed: f32,
    split_sentences: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_ref_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_ref_name: Option<&'a str>,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 英语模型
    pub model: String,
    /// 非英语语言使用的模型，未配置时使用 `model`
    pub multilingual_model: Option<String>,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 网络错误重试次数
    pub max_retries: u32,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            model: "tts_models/multilingual/multi-dataset/xtts_v2".to_string(),
            multilingual_model: None,
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_models(mut self, model: impl Into<String>, multilingual: Option<String>) -> Self {
        self.model = model.into();
        self.multilingual_model = multilingual;
        self
    }

    /// 按语言选择模型
    pub fn model_for(&self, language: &str) -> &str {
        match &self.multilingual_model {
            Some(m) if !language.eq_ignore_ascii_case("en") => m,
            _ => &self.model,
        }
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/tts/generate", self.config.base_url.trim_end_matches('/'))
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }

    async fn send(&self, body: &TtsHttpRequest<'_>) -> Result<reqwest::Response, TtsError> {
        let mut attempt = 0;
        loop {
            let result = self.client.post(self.generate_url()).json(body).send().await;
            match result {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.config.max_retries && (e.is_connect() || e.is_timeout()) => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %e, "TTS request failed, retrying");
                }
                Err(e) if e.is_timeout() => return Err(TtsError::Timeout),
                Err(e) if e.is_connect() => {
                    return Err(TtsError::NetworkError(format!(
                        "Cannot connect to TTS service: {}",
                        e
                    )))
                }
                Err(e) => return Err(TtsError::NetworkError(e.to_string())),
            }
        }
    }
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisOutput, TtsError> {
        let model = self.config.model_for(&request.language);
        let body = TtsHttpRequest {
            text: &request.text,
            language: &request.language,
            speaker: &request.speaker,
            model,
            exaggeration: request.exaggeration,
            cfg_weight: request.cfg_weight,
            temperature: request.temperature,
            speed: request.speed,
            split_sentences: true,
            voice_ref_base64: request.voice_ref.as_ref().map(|v| BASE64.encode(&v.data)),
            voice_ref_name: request.voice_ref.as_ref().map(|v| v.name.as_str()),
        };

        tracing::debug!(
            url = %self.generate_url(),
            model,
            text_len = request.text.len(),
            cloned = request.voice_ref.is_some(),
            "Sending TTS generate request"
        );

        let response = self.send(&body).await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!("HTTP {}: {}", status, error_text)));
        }

        let headers = response.headers();
        let duration_ms = headers
            .get("X-TTS-Duration-Ms")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let sample_rate = headers
            .get("X-TTS-Sample-Rate")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        if audio_data.is_empty() {
            return Err(TtsError::InvalidResponse("Empty audio body".to_string()));
        }

        tracing::info!(
            duration_ms = ?duration_ms,
            sample_rate = ?sample_rate,
            audio_size = audio_data.len(),
            "TTS inference completed"
        );

        Ok(SynthesisOutput {
            audio_data,
            sample_rate,
            duration_ms,
        })
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn model_name(&self) -> String {
        self.config.model.clone()
    }
}
