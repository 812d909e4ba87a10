//! Storage Adapter - 文件系统存储

mod scratch_storage;
mod voice_store;

pub use scratch_storage::FileScratchStorage;
pub use voice_store::FileVoiceStore;
