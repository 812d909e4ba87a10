//! Cleanup Handler

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{CleanupScratch, GcResult};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// DELETE /cleanup - 删除过期临时音频
pub async fn cleanup(State(state): State<Arc<AppState>>) -> Result<Json<GcResult>, ApiError> {
    let result = state
        .cleanup_handler
        .handle(CleanupScratch {
            max_age: state.defaults.cleanup_max_age,
        })
        .await?;
    Ok(Json(result))
}
