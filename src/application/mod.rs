//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、MediaFilter、AudioProcessor、VoiceStore、ScratchStorage）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

pub use commands::{
    handlers::{CleanupScratchHandler, GenerateSpeechHandler, PostProcessSettings, UploadVoiceHandler},
    CleanupScratch, GenerateSpeech, GeneratedSpeech, UploadVoice, VoiceSource,
};

pub use error::ApplicationError;

pub use ports::{
    AudioProcessorPort, DenoiseError, GcResult, MediaFilterError, MediaFilterPort, ScratchError,
    ScratchFile, ScratchStoragePort, StoredVoice, SynthesisOutput, SynthesisRequest, TtsEnginePort,
    TtsError, VoiceReference, VoiceStoreError, VoiceStorePort,
};

pub use queries::{handlers::ListVoicesHandler, ListVoices};
