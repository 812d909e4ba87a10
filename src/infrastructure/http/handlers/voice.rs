//! Voice HTTP Handlers

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::application::{ListVoices, UploadVoice};
use crate::infrastructure::http::dto::{UploadVoiceResponse, VoicesResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 上传参考音频（字段 `voice` 或 `audio`）
pub async fn upload_voice(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadVoiceResponse>, ApiError> {
    let mut upload: Option<UploadVoice> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name != "voice" && field_name != "audio" {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().trim().to_string();
        if original_name.is_empty() {
            return Err(ApiError::BadRequest("Empty filename".to_string()));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
            .to_vec();

        upload = Some(UploadVoice {
            original_name,
            data,
        });
    }

    let command = upload.ok_or_else(|| ApiError::BadRequest("No voice file provided".to_string()))?;
    let stored = state.upload_voice_handler.handle(command).await?;

    Ok(Json(UploadVoiceResponse {
        success: true,
        message: "Voice uploaded successfully".to_string(),
        path: stored.path.display().to_string(),
        filename: stored.file_name,
    }))
}

/// 列出已上传的参考音频
pub async fn list_voices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VoicesResponse>, ApiError> {
    let voices = state.list_voices_handler.handle(ListVoices).await?;
    Ok(Json(VoicesResponse { voices }))
}
