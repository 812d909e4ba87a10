//! Speech HTTP Handlers
//!
//! JSON 合成、multipart 克隆合成、serverless 事件接口

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Multipart, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use base64::Engine as _;
use http::HeaderName;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::application::{GenerateSpeech, GeneratedSpeech, VoiceSource};
use crate::domain::speech::require_text;
use crate::infrastructure::http::dto::{GenerateRequest, RunSyncEvent, RunSyncHealth, RunSyncOutput};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 内联参考音频在日志中的名称
const INLINE_VOICE_NAME: &str = "speaker.wav";

const X_GENERATION_TIME: HeaderName = HeaderName::from_static("x-generation-time");
const X_TOTAL_TIME: HeaderName = HeaderName::from_static("x-total-time");

async fn generate(
    state: &AppState,
    request: &GenerateRequest,
    voice: Option<VoiceSource>,
) -> Result<GeneratedSpeech, ApiError> {
    // 先检查文本，缺失时不再解析其他参数
    let text = require_text(request.text.as_deref())?.to_string();
    let params = request.params(state.defaults.denoiser_strength)?;
    let voice = match voice {
        Some(voice) => voice,
        None => request.voice_source()?,
    };

    let span = tracing::info_span!("generate", request_id = %Uuid::new_v4());
    let speech = state
        .generate_speech_handler
        .handle(GenerateSpeech {
            text,
            params,
            voice,
        })
        .instrument(span)
        .await?;
    Ok(speech)
}

fn audio_response(speech: GeneratedSpeech, started: Instant) -> Result<Response, ApiError> {
    let extension = speech.format.extension();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, speech.format.content_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"speech.{}\"", extension),
        )
        .header(
            X_GENERATION_TIME,
            format!("{:.2}", speech.generation_time.as_secs_f64()),
        )
        .header(X_TOTAL_TIME, format!("{:.2}", started.elapsed().as_secs_f64()))
        .body(Body::from(speech.audio))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

/// POST /generate - JSON 请求
pub async fn generate_speech(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let Json(request) = payload?;
    let speech = generate(&state, &request, None).await?;
    audio_response(speech, started)
}

fn parse_number(name: &str, value: &str) -> Result<f32, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid value for {}: {}", name, value)))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ApiError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ApiError::BadRequest(format!("Invalid value for {}: {}", name, value))),
    }
}

/// POST /generate-cloned, /generate-audio - multipart 请求，`speaker_wav` 为参考音频
pub async fn generate_cloned(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let mut request = GenerateRequest::default();
    let mut speaker: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        if field_name == "speaker_wav" {
            let name = field
                .file_name()
                .map(str::to_string)
                .unwrap_or_else(|| INLINE_VOICE_NAME.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read speaker_wav: {}", e)))?;
            speaker = Some((name, data.to_vec()));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", field_name, e)))?;

        match field_name.as_str() {
            "text" => request.text = Some(value),
            "language" | "language_id" => request.language = Some(value),
            "speaker" => request.speaker = Some(value),
            "exaggeration" => request.exaggeration = Some(parse_number(&field_name, &value)?),
            "cfg_weight" => request.cfg_weight = Some(parse_number(&field_name, &value)?),
            "temperature" => request.temperature = Some(parse_number(&field_name, &value)?),
            "speed" => request.speed = Some(parse_number(&field_name, &value)?),
            "denoiser_strength" => {
                request.denoiser_strength = Some(parse_number(&field_name, &value)?)
            }
            "output_format" => request.output_format = Some(value),
            "master" => request.master = Some(parse_bool(&field_name, &value)?),
            _ => {}
        }
    }

    require_text(request.text.as_deref())?;
    let (name, data) =
        speaker.ok_or_else(|| ApiError::BadRequest("No speaker_wav file provided".to_string()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("speaker_wav file is empty".to_string()));
    }

    let speech = generate(&state, &request, Some(VoiceSource::Inline { name, data })).await?;
    audio_response(speech, started)
}

/// POST /runsync - serverless 事件，返回 base64 音频
pub async fn run_sync(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RunSyncEvent>, JsonRejection>,
) -> Result<Json<RunSyncOutput>, ApiError> {
    let Json(event) = payload?;
    let request = event.input.to_request();

    let voice = match event
        .input
        .voice_file_base64
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(encoded) => {
            let data = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| ApiError::BadRequest(format!("Invalid voice file: {}", e)))?;
            Some(VoiceSource::Inline {
                name: INLINE_VOICE_NAME.to_string(),
                data,
            })
        }
        None => None,
    };

    let speech = generate(&state, &request, voice).await?;

    Ok(Json(RunSyncOutput {
        audio_base64: base64::engine::general_purpose::STANDARD.encode(&speech.audio),
        format: speech.format.to_string(),
        sample_rate: speech.sample_rate,
        language: speech.language,
    }))
}

/// GET /runsync/health
pub async fn run_sync_health(State(state): State<Arc<AppState>>) -> Json<RunSyncHealth> {
    Json(RunSyncHealth {
        status: "healthy",
        model_loaded: state.tts_engine.is_ready(),
        model: state.tts_engine.model_name(),
    })
}
