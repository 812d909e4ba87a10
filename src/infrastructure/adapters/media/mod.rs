//! Media Adapter - 外部音频滤镜

mod ffmpeg_filter;
mod noop_filter;

pub use ffmpeg_filter::{locate_ffmpeg, FfmpegConfig, FfmpegMediaFilter, MASTERING_FILTER};
pub use noop_filter::NoopMediaFilter;
