//! Voice Queries

/// 列出已上传的参考音频
#[derive(Debug, Clone)]
pub struct ListVoices;
