//! System Handlers
//!
//! 服务状态、健康检查与模型信息

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::domain::speech::SUPPORTED_LANGUAGES;
use crate::infrastructure::http::state::AppState;

fn status_label(ready: bool) -> &'static str {
    if ready {
        "ready"
    } else {
        "loading"
    }
}

/// GET / - 服务概览
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "service": state.info.service,
        "model": state.tts_engine.model_name(),
        "status": status_label(state.tts_engine.is_ready()),
    }))
}

/// GET /health - 引擎未就绪时返回 503
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if !state.tts_engine.is_ready() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "loading",
                "message": "Model still loading",
            })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": state.info.service,
            "model": state.tts_engine.model_name(),
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// GET /info - 功能与参数说明
pub async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "service": state.info.service,
        "model": state.tts_engine.model_name(),
        "backend": state.info.backend,
        "supported_languages": SUPPORTED_LANGUAGES,
        "features": {
            "voice_cloning": true,
            "multilingual": true,
            "emotion_control": true,
            "denoiser": true,
            "mastering": state.info.mastering_available,
            "mp3_output": state.info.mastering_available,
        },
        "available_speakers": state.info.speakers,
        "quality_tips": {
            "temperature": "Lower (0.5-0.7) for more consistent, higher (0.8-0.95) for more expressive",
            "speed": "0.9-1.1 for natural pacing",
            "exaggeration": "0.5 is neutral, raise it for more dramatic delivery",
            "speaker": "Try different speakers - some sound more natural than others",
        },
    }))
}

/// GET /models
pub async fn models(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "current_model": state.tts_engine.model_name(),
        "available_models": state.info.models,
    }))
}
