//! HTTP Handlers

mod cleanup;
mod speech;
mod system;
mod voice;

pub use cleanup::*;
pub use speech::*;
pub use system::*;
pub use voice::*;
