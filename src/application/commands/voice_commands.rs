//! Voice Commands

/// 上传参考音频命令
#[derive(Debug, Clone)]
pub struct UploadVoice {
    /// 客户端提供的原始文件名
    pub original_name: String,
    pub data: Vec<u8>,
}
