//! Cleanup Command Handlers

use std::sync::Arc;

use crate::application::commands::CleanupScratch;
use crate::application::error::ApplicationError;
use crate::application::ports::{GcResult, ScratchStoragePort};

/// CleanupScratch Handler
pub struct CleanupScratchHandler {
    scratch: Arc<dyn ScratchStoragePort>,
}

impl CleanupScratchHandler {
    pub fn new(scratch: Arc<dyn ScratchStoragePort>) -> Self {
        Self { scratch }
    }

    pub async fn handle(&self, command: CleanupScratch) -> Result<GcResult, ApplicationError> {
        let result = self.scratch.gc(command.max_age).await?;

        tracing::info!(
            deleted_files = result.deleted_files,
            freed_bytes = result.freed_bytes,
            max_age_secs = command.max_age.as_secs(),
            "Scratch cleanup finished"
        );

        Ok(result)
    }
}
