//! Command Handlers 实现

mod cleanup_handlers;
mod speech_handlers;
mod voice_handlers;

pub use cleanup_handlers::*;
pub use speech_handlers::*;
pub use voice_handlers::*;
