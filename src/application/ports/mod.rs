//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_processor;
mod media_filter;
mod scratch_storage;
mod tts_engine;
mod voice_store;

pub use audio_processor::{AudioProcessorPort, DenoiseError};
pub use media_filter::{MediaFilterError, MediaFilterPort};
pub use scratch_storage::{GcResult, ScratchError, ScratchFile, ScratchStoragePort};
pub use tts_engine::{SynthesisOutput, SynthesisRequest, TtsEnginePort, TtsError, VoiceReference};
pub use voice_store::{StoredVoice, VoiceStoreError, VoiceStorePort};
