//! TTS Adapter - 推理引擎实现

mod fake_tts_client;
mod http_tts_client;
mod lazy_engine;

pub use fake_tts_client::{FakeTtsClient, FakeTtsClientConfig};
pub use http_tts_client::{HttpTtsClient, HttpTtsClientConfig};
pub use lazy_engine::{EngineFactory, LazyEngine};
