//! hearo-tts - 神经 TTS 服务前端
//!
//! - Domain: speech, dsp, dataset, text normalizer
//! - Application: commands, queries, ports
//! - Infrastructure: http, worker, adapters

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use hearo_tts::application::{
    CleanupScratchHandler, GenerateSpeechHandler, ListVoicesHandler, MediaFilterPort,
    PostProcessSettings, TtsEnginePort, TtsError, UploadVoiceHandler,
};
use hearo_tts::config::{load_config, print_config, AppConfig, LogConfig, TtsBackend};
use hearo_tts::infrastructure::adapters::{
    EngineFactory, FakeTtsClient, FakeTtsClientConfig, FfmpegConfig, FfmpegMediaFilter,
    FileScratchStorage, FileVoiceStore, HttpTtsClient, HttpTtsClientConfig, LazyEngine,
    WavDenoiser,
};
use hearo_tts::infrastructure::http::{
    AppState, HttpServer, RequestDefaults, ServerConfig, ServiceInfo,
};
use hearo_tts::infrastructure::worker::{CleanupWorker, CleanupWorkerConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// 初始化日志；RUST_LOG 优先于配置
fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// 按配置的后端创建引擎工厂
fn engine_factory(config: &AppConfig) -> EngineFactory {
    match config.tts.backend {
        TtsBackend::Http => {
            let client_config = HttpTtsClientConfig::new(&config.tts.url)
                .with_timeout(config.tts.timeout_secs)
                .with_models(&config.tts.model, config.tts.multilingual_model.clone());
            let client_config = HttpTtsClientConfig {
                max_retries: config.tts.max_retries,
                ..client_config
            };
            Box::new(move || {
                let client_config = client_config.clone();
                async move {
                    let client = HttpTtsClient::new(client_config)?;
                    if !client.health_check().await {
                        tracing::warn!("TTS service health check failed, requests may fail");
                    }
                    Ok::<Arc<dyn TtsEnginePort>, TtsError>(Arc::new(client))
                }
                .boxed()
            })
        }
        TtsBackend::Fake => {
            let fake_config = FakeTtsClientConfig {
                sample_rate: config.audio.sample_rate,
                ..Default::default()
            };
            Box::new(move || {
                let engine: Arc<dyn TtsEnginePort> = Arc::new(FakeTtsClient::new(fake_config.clone()));
                async move { Ok::<_, TtsError>(engine) }.boxed()
            })
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("hearo-tts v{}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    // 创建存储适配器
    let voice_store = Arc::new(FileVoiceStore::new(&config.storage.voices_dir).await?);
    let scratch = Arc::new(FileScratchStorage::new(&config.storage.scratch_dir).await?);

    // 创建 TTS 引擎（单次初始化）
    let engine = Arc::new(LazyEngine::new(config.tts.model.clone(), engine_factory(&config)));
    if config.tts.preload {
        let warm = engine.clone();
        tokio::spawn(async move {
            // 失败时单元保持为空，首个请求会重试
            let _ = warm.warm_up().await;
        });
    }
    let tts_engine: Arc<dyn TtsEnginePort> = engine;

    // 创建 ffmpeg 滤镜
    let media_filter = Arc::new(FfmpegMediaFilter::locate(FfmpegConfig {
        extra_paths: config.mastering.ffmpeg_paths.clone(),
        timeout: Duration::from_secs(config.mastering.timeout_secs),
        sample_rate: config.audio.sample_rate,
    }));

    let generate_speech_handler = GenerateSpeechHandler::new(
        tts_engine.clone(),
        voice_store.clone(),
        scratch.clone(),
        Arc::new(WavDenoiser::new()),
        media_filter.clone(),
        PostProcessSettings {
            mastering_enabled: config.audio.mastering_enabled,
            sample_rate: config.audio.sample_rate,
        },
    );
    let cleanup_handler = Arc::new(CleanupScratchHandler::new(scratch));

    // 启动清理 Worker
    let shutdown = CancellationToken::new();
    if config.cleanup.enabled {
        let worker = CleanupWorker::new(
            CleanupWorkerConfig {
                interval: config.cleanup.interval(),
                max_age: config.cleanup.max_age(),
            },
            cleanup_handler.clone(),
            shutdown.clone(),
        );
        tokio::spawn(worker.run());
    }

    let state = AppState::new(
        tts_engine,
        generate_speech_handler,
        UploadVoiceHandler::new(voice_store.clone()),
        cleanup_handler,
        ListVoicesHandler::new(voice_store),
        ServiceInfo {
            service: "hearo-tts".to_string(),
            backend: config.tts.backend.to_string(),
            models: config.tts.available_models(),
            speakers: config.tts.speakers.clone(),
            mastering_available: media_filter.is_available(),
        },
        RequestDefaults {
            denoiser_strength: config.audio.default_denoiser_strength,
            cleanup_max_age: config.cleanup.max_age(),
        },
    );

    let server_config = ServerConfig::new(
        &config.server.host,
        config.server.port,
        config.storage.max_upload_size as usize,
    );
    let server = HttpServer::new(server_config, Arc::new(state));

    // 启动服务器（带优雅关闭）
    let worker_shutdown = shutdown.clone();
    server
        .run_with_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
            worker_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    tracing::info!("Server shutdown complete");

    Ok(())
}
