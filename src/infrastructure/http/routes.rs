//! HTTP Routes
//!
//! API Endpoints:
//! - /                  GET     服务概览
//! - /health            GET     健康检查（引擎加载中返回 503）
//! - /info              GET     功能、语言、说话人
//! - /models            GET     模型列表
//! - /generate          POST    JSON 合成
//! - /generate-cloned   POST    multipart 克隆合成
//! - /generate-audio    POST    同 /generate-cloned
//! - /voices/upload     POST    上传参考音频
//! - /voices            GET     列出参考音频
//! - /cleanup           DELETE  清理过期临时音频
//! - /runsync           POST    serverless 事件（base64 音频）
//! - /runsync/health    GET     serverless 健康检查

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/info", get(handlers::info))
        .route("/models", get(handlers::models))
        .route("/generate", post(handlers::generate_speech))
        .route("/generate-cloned", post(handlers::generate_cloned))
        .route("/generate-audio", post(handlers::generate_cloned))
        .route("/cleanup", delete(handlers::cleanup))
        .merge(voice_routes())
        .merge(runsync_routes())
}

/// Voice 路由
fn voice_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/voices", get(handlers::list_voices))
        .route("/voices/upload", post(handlers::upload_voice))
}

/// Serverless 路由
fn runsync_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/runsync", post(handlers::run_sync))
        .route("/runsync/health", get(handlers::run_sync_health))
}
