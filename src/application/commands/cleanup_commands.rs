//! Cleanup Commands

use std::time::Duration;

/// 清理过期临时音频
#[derive(Debug, Clone)]
pub struct CleanupScratch {
    pub max_age: Duration,
}

impl Default for CleanupScratch {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(3600),
        }
    }
}
