//! Cleanup Worker - 定期清理临时目录

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::application::{CleanupScratch, CleanupScratchHandler};

/// Worker 配置
#[derive(Debug, Clone)]
pub struct CleanupWorkerConfig {
    /// 两次清理之间的间隔
    pub interval: Duration,
    /// 超过该时长未修改的文件被删除
    pub max_age: Duration,
}

impl Default for CleanupWorkerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            max_age: Duration::from_secs(3600),
        }
    }
}

/// 清理 Worker
pub struct CleanupWorker {
    config: CleanupWorkerConfig,
    handler: Arc<CleanupScratchHandler>,
    shutdown: CancellationToken,
}

impl CleanupWorker {
    pub fn new(
        config: CleanupWorkerConfig,
        handler: Arc<CleanupScratchHandler>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            handler,
            shutdown,
        }
    }

    /// 启动 Worker，直到收到取消信号
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            max_age_secs = self.config.max_age.as_secs(),
            "CleanupWorker started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let command = CleanupScratch { max_age: self.config.max_age };
                    if let Err(e) = self.handler.handle(command).await {
                        tracing::error!(error = %e, "Scheduled cleanup failed");
                    }
                }
            }
        }

        tracing::info!("CleanupWorker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FileScratchStorage;
    use std::time::SystemTime;

    #[tokio::test]
    async fn test_worker_sweeps_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("output_stale.wav");
        std::fs::write(&stale, b"x").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(7200))
            .unwrap();

        let storage = Arc::new(FileScratchStorage::new(dir.path()).await.unwrap());
        let handler = Arc::new(CleanupScratchHandler::new(storage));
        let token = CancellationToken::new();
        let worker = CleanupWorker::new(
            CleanupWorkerConfig {
                interval: Duration::from_millis(20),
                max_age: Duration::from_secs(3600),
            },
            handler,
            token.clone(),
        );

        let task = tokio::spawn(worker.run());
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
        task.await.unwrap();

        assert!(!stale.exists());
    }
}
