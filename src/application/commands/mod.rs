//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：合成、上传参考音频、清理临时文件

mod cleanup_commands;
mod speech_commands;
mod voice_commands;

pub mod handlers;

pub use cleanup_commands::*;
pub use speech_commands::*;
pub use voice_commands::*;
