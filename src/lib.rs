//! hearo-tts - 神经 TTS 服务前端与音频后处理链
//!
//! 架构设计: CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Speech: 合成参数与参考音频文件名
//! - Text Normalizer: 文本预处理
//! - DSP: Butterworth 高通、零相位滤波、幅度门限、重采样
//! - Dataset: 训练数据切分
//!
//! 应用层 (application/):
//! - Ports: TtsEngine, MediaFilter, AudioProcessor, VoiceStore, ScratchStorage
//! - Commands: 合成、上传音色、清理临时文件
//! - Queries: 音色列表
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Adapters: TTS Client, ffmpeg, WAV 降噪, 文件存储
//! - Worker: 临时文件定期清理

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
