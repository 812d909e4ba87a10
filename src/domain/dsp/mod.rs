//! 数字信号处理
//!
//! - filter: Butterworth 设计与零相位滤波
//! - gate: 平滑噪声门
//! - denoise: 高通 + 噪声门降噪算法
//! - resample: 声道混合与 sinc 重采样

mod denoise;
mod filter;
mod gate;
mod resample;

use thiserror::Error;

pub use denoise::{
    denoise_channels, float_to_pcm16, pcm16_to_float, DenoiseParams, DenoiseReport, PEAK_TARGET,
};
pub use filter::{butter_highpass, filtfilt, lfilter, lfilter_zi, TransferFunction};
pub use gate::{moving_average_same, smooth_gate};
pub use resample::{mix_to_mono, resample};

/// DSP 错误
#[derive(Debug, Error)]
pub enum DspError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Signal too short for zero-phase filtering: {len} samples, need more than {padlen}")]
    SignalTooShort { len: usize, padlen: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Resampling failed: {0}")]
    Resample(String),
}
