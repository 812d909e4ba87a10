//! Worker Layer - Background Task Processing
//!
//! 实现 CleanupWorker，定期清理过期临时音频

mod cleanup_worker;

pub use cleanup_worker::{CleanupWorker, CleanupWorkerConfig};
