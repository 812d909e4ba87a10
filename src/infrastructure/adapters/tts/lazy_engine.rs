//! Lazy Engine - 引擎单次初始化
//!
//! 持有工厂与 `OnceCell`：并发首次访问时工厂只运行一次，
//! 初始化失败时单元保持为空，下次调用重试。
//! 预热进行中的请求返回 `TtsError::NotReady`。

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::application::ports::{SynthesisOutput, SynthesisRequest, TtsEnginePort, TtsError};

/// 引擎工厂
pub type EngineFactory =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn TtsEnginePort>, TtsError>> + Send + Sync>;

pub struct LazyEngine {
    factory: EngineFactory,
    cell: OnceCell<Arc<dyn TtsEnginePort>>,
    warming: AtomicBool,
    /// 初始化前 /health 展示的模型名
    model_name: String,
}

impl LazyEngine {
    pub fn new(model_name: impl Into<String>, factory: EngineFactory) -> Self {
        Self {
            factory,
            cell: OnceCell::new(),
            warming: AtomicBool::new(false),
            model_name: model_name.into(),
        }
    }

    /// 已就绪的引擎实例
    pub fn from_engine(engine: Arc<dyn TtsEnginePort>) -> Self {
        let model_name = engine.model_name();
        let ready = engine.clone();
        let lazy = Self::new(model_name, Box::new(move || {
            let engine = ready.clone();
            async move { Ok::<_, TtsError>(engine) }.boxed()
        }));
        let _ = lazy.cell.set(engine);
        lazy
    }

    async fn initialize(&self) -> Result<&Arc<dyn TtsEnginePort>, TtsError> {
        self.cell
            .get_or_try_init(|| async {
                tracing::info!(model = %self.model_name, "Initializing TTS engine");
                let engine = (self.factory)().await?;
                tracing::info!(model = %engine.model_name(), "TTS engine ready");
                Ok(engine)
            })
            .await
    }

    /// 启动时预热；完成前的请求得到 NotReady
    pub async fn warm_up(&self) -> Result<(), TtsError> {
        self.warming.store(true, Ordering::SeqCst);
        let result = self.initialize().await.map(|_| ());
        self.warming.store(false, Ordering::SeqCst);
        if let Err(e) = &result {
            tracing::error!(error = %e, "TTS engine warm-up failed");
        }
        result
    }

    async fn engine(&self) -> Result<&Arc<dyn TtsEnginePort>, TtsError> {
        if let Some(engine) = self.cell.get() {
            return Ok(engine);
        }
        if self.warming.load(Ordering::SeqCst) {
            return Err(TtsError::NotReady(
                "Model is still loading, please retry shortly".to_string(),
            ));
        }
        self.initialize().await
    }
}

#[async_trait]
impl TtsEnginePort for LazyEngine {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisOutput, TtsError> {
        self.engine().await?.synthesize(request).await
    }

    async fn health_check(&self) -> bool {
        match self.cell.get() {
            Some(engine) => engine.health_check().await,
            None => false,
        }
    }

    fn is_ready(&self) -> bool {
        self.cell.initialized()
    }

    fn model_name(&self) -> String {
        self.cell
            .get()
            .map(|engine| engine.model_name())
            .unwrap_or_else(|| self.model_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::tts::FakeTtsClient;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn counting_factory(counter: Arc<AtomicUsize>, delay: Duration) -> EngineFactory {
        Box::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                Ok::<_, TtsError>(Arc::new(FakeTtsClient::default()) as Arc<dyn TtsEnginePort>)
            }
            .boxed()
        })
    }

    fn request() -> SynthesisRequest {
        SynthesisRequest {
            text: "Hello".to_string(),
            language: "en".to_string(),
            speaker: "Claribel Dervla".to_string(),
            exaggeration: 0.5,
            cfg_weight: 0.5,
            temperature: 0.5,
            speed: 1.0,
            voice_ref: None,
        }
    }

    #[tokio::test]
    async fn test_concurrent_first_access_initializes_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let engine = Arc::new(LazyEngine::new(
            "fake",
            counting_factory(counter.clone(), Duration::from_millis(50)),
        ));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.synthesize(request()).await.is_ok() })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap());
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(engine.is_ready());
    }

    #[tokio::test]
    async fn test_requests_during_warm_up_are_not_ready() {
        let counter = Arc::new(AtomicUsize::new(0));
        let engine = Arc::new(LazyEngine::new(
            "fake",
            counting_factory(counter, Duration::from_millis(200)),
        ));

        let warm = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.warm_up().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!engine.is_ready());
        let err = engine.synthesize(request()).await.unwrap_err();
        assert!(matches!(err, TtsError::NotReady(_)));

        warm.await.unwrap().unwrap();
        assert!(engine.is_ready());
        assert!(engine.synthesize(request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_init_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let engine = LazyEngine::new(
            "flaky",
            Box::new(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(TtsError::NetworkError("upstream down".to_string()))
                    } else {
                        Ok(Arc::new(FakeTtsClient::default()) as Arc<dyn TtsEnginePort>)
                    }
                }
                .boxed()
            }),
        );

        assert!(engine.warm_up().await.is_err());
        assert!(!engine.is_ready());
        assert_eq!(engine.model_name(), "flaky");

        assert!(engine.synthesize(request()).await.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(engine.model_name(), "fake-tone");
    }

    #[tokio::test]
    async fn test_from_engine_is_ready() {
        let engine = LazyEngine::from_engine(Arc::new(FakeTtsClient::default()));
        assert!(engine.is_ready());
        assert!(engine.health_check().await);
    }
}
