//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, TtsBackend};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "HEARO";

/// 加载应用配置
///
/// # 环境变量示例
/// - `HEARO_SERVER__PORT=8080`
/// - `HEARO_TTS__URL=http://gpu-box:9000`
/// - `HEARO_TTS__BACKEND=fake`
/// - `HEARO_AUDIO__MASTERING_ENABLED=true`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("tts.backend", "http")?
        .set_default("tts.url", "http://localhost:9000")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("tts.max_retries", 0)?
        .set_default("tts.preload", true)?
        .set_default("audio.sample_rate", 22050)?
        .set_default("audio.mastering_enabled", false)?
        .set_default("audio.default_denoiser_strength", 0.02)?
        .set_default("mastering.timeout_secs", 10)?
        .set_default("storage.voices_dir", "uploads/voices")?
        .set_default("storage.scratch_dir", "data/scratch")?
        .set_default("storage.max_upload_size", 50 * 1024 * 1024)?
        .set_default("cleanup.enabled", false)?
        .set_default("cleanup.interval_secs", 3600)?
        .set_default("cleanup.max_age_secs", 3600)?
        .set_default("log.level", "info,hearo_tts=info,tower_http=debug")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 层级分隔符: __ (双下划线)，例如 HEARO_TTS__URL
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.backend == TtsBackend::Http && config.tts.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty with the http backend".to_string(),
        ));
    }

    if config.tts.timeout_secs == 0 || config.mastering.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Timeouts must be greater than 0".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.audio.default_denoiser_strength) {
        return Err(ConfigError::ValidationError(
            "audio.default_denoiser_strength must be between 0 and 1".to_string(),
        ));
    }

    if config.cleanup.enabled && config.cleanup.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Cleanup interval cannot be 0 when cleanup is enabled".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("TTS Backend: {}", config.tts.backend);
    if config.tts.backend == TtsBackend::Http {
        tracing::info!("TTS URL: {}", config.tts.url);
        tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    }
    tracing::info!("TTS Model: {}", config.tts.model);
    if let Some(model) = &config.tts.multilingual_model {
        tracing::info!("TTS Multilingual Model: {}", model);
    }
    tracing::info!("Preload: {}", config.tts.preload);
    tracing::info!("Mastering Enabled: {}", config.audio.mastering_enabled);
    tracing::info!("Voices Directory: {:?}", config.storage.voices_dir);
    tracing::info!("Scratch Directory: {:?}", config.storage.scratch_dir);
    tracing::info!("Cleanup Enabled: {}", config.cleanup.enabled);
    if config.cleanup.enabled {
        tracing::info!("Cleanup Interval: {}s", config.cleanup.interval_secs);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_url_only_matters_for_http_backend() {
        let mut config = AppConfig::default();
        config.tts.url = String::new();
        assert!(validate_config(&config).is_err());

        config.tts.backend = TtsBackend::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_timeout() {
        let mut config = AppConfig::default();
        config.mastering.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_cleanup_interval() {
        let mut config = AppConfig::default();
        config.cleanup.interval_secs = 0;
        assert!(validate_config(&config).is_ok());

        config.cleanup.enabled = true;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9100

[tts]
backend = "fake"
model = "chatterbox"
speakers = ["Ana Florence"]

[audio]
mastering_enabled = true
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.tts.backend, TtsBackend::Fake);
        assert_eq!(config.tts.model, "chatterbox");
        assert_eq!(config.tts.speakers, vec!["Ana Florence"]);
        assert!(config.audio.mastering_enabled);
        assert_eq!(config.storage.max_upload_size, 50 * 1024 * 1024);
    }
}
