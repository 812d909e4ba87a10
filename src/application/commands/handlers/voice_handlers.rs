//! Voice Command Handlers

use std::sync::Arc;

use crate::application::commands::UploadVoice;
use crate::application::error::ApplicationError;
use crate::application::ports::{StoredVoice, VoiceStorePort};

/// UploadVoice Handler
pub struct UploadVoiceHandler {
    voice_store: Arc<dyn VoiceStorePort>,
}

impl UploadVoiceHandler {
    pub fn new(voice_store: Arc<dyn VoiceStorePort>) -> Self {
        Self { voice_store }
    }

    pub async fn handle(&self, command: UploadVoice) -> Result<StoredVoice, ApplicationError> {
        if command.data.is_empty() {
            return Err(ApplicationError::validation("Uploaded voice file is empty"));
        }

        let stored = self
            .voice_store
            .save(&command.original_name, &command.data)
            .await?;

        tracing::info!(
            original_name = %command.original_name,
            file_name = %stored.file_name,
            size = stored.size,
            "Voice reference uploaded"
        );

        Ok(stored)
    }
}
