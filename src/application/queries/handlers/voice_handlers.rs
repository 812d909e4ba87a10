//! Voice Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::VoiceStorePort;
use crate::application::queries::ListVoices;

/// ListVoices Handler
pub struct ListVoicesHandler {
    voice_store: Arc<dyn VoiceStorePort>,
}

impl ListVoicesHandler {
    pub fn new(voice_store: Arc<dyn VoiceStorePort>) -> Self {
        Self { voice_store }
    }

    pub async fn handle(&self, _query: ListVoices) -> Result<Vec<String>, ApplicationError> {
        Ok(self.voice_store.list().await?)
    }
}
