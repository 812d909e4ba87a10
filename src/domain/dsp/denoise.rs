//! 降噪算法 - 高通滤波 + 平滑噪声门 + 峰值归一化
//!
//! 只处理内存中的浮点样本；文件读写由基础设施层的 WAV 处理器负责。

use super::filter::{butter_highpass, filtfilt};
use super::gate::smooth_gate;
use super::DspError;

/// 峰值归一化目标（满刻度比例）
pub const PEAK_TARGET: f64 = 0.95;

/// 高通滤波器阶数
const FILTER_ORDER: usize = 4;

/// 噪声门平滑窗口（秒）
const GATE_SMOOTHING_SECS: f64 = 0.005;

/// 降噪参数
#[derive(Debug, Clone, Copy)]
pub struct DenoiseParams {
    /// 降噪强度 [0, 1]
    pub strength: f64,
    /// 采样率
    pub sample_rate: u32,
}

impl DenoiseParams {
    pub fn new(strength: f64, sample_rate: u32) -> Self {
        Self {
            strength,
            sample_rate,
        }
    }

    /// 截止频率：50 Hz 起，随强度线性上升
    pub fn cutoff_hz(&self) -> f64 {
        50.0 + self.strength * 1500.0
    }

    /// 相对 Nyquist 的截止频率，上限 0.99
    pub fn normalized_cutoff(&self) -> f64 {
        let nyquist = self.sample_rate as f64 / 2.0;
        (self.cutoff_hz() / nyquist).min(0.99)
    }

    pub fn gate_threshold(&self) -> f64 {
        self.strength * 2.0
    }

    pub fn smoothing_kernel(&self) -> usize {
        (self.sample_rate as f64 * GATE_SMOOTHING_SECS) as usize
    }
}

/// 降噪结果摘要
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenoiseReport {
    pub cutoff_hz: f64,
    pub gate_threshold: f64,
    /// 归一化前的峰值
    pub peak: f64,
}

/// 对各声道执行降噪，峰值归一化在所有声道上统一进行
pub fn denoise_channels(
    channels: &[Vec<f64>],
    params: DenoiseParams,
) -> Result<(Vec<Vec<f64>>, DenoiseReport), DspError> {
    if !(0.0..=1.0).contains(&params.strength) {
        return Err(DspError::InvalidParameter(format!(
            "strength must be in [0, 1], got {}",
            params.strength
        )));
    }
    if params.sample_rate == 0 {
        return Err(DspError::InvalidParameter("sample rate must be positive".to_string()));
    }

    let tf = butter_highpass(FILTER_ORDER, params.normalized_cutoff())?;
    let threshold = params.gate_threshold();
    let kernel = params.smoothing_kernel();

    let mut processed = Vec::with_capacity(channels.len());
    for channel in channels {
        let filtered = filtfilt(&tf, channel)?;
        let gate = smooth_gate(&filtered, threshold, kernel);
        let gated: Vec<f64> = filtered.iter().zip(&gate).map(|(x, g)| x * g).collect();
        processed.push(gated);
    }

    let peak = processed
        .iter()
        .flat_map(|c| c.iter())
        .fold(0.0_f64, |acc, x| acc.max(x.abs()));

    if peak > 0.0 {
        let scale = PEAK_TARGET / peak;
        for channel in processed.iter_mut() {
            for x in channel.iter_mut() {
                *x *= scale;
            }
        }
    }

    Ok((
        processed,
        DenoiseReport {
            cutoff_hz: params.cutoff_hz(),
            gate_threshold: threshold,
            peak,
        },
    ))
}

/// 16 位 PCM -> [-1, 1] 浮点
pub fn pcm16_to_float(samples: &[i16]) -> Vec<f64> {
    samples.iter().map(|&s| s as f64 / 32768.0).collect()
}

/// [-1, 1] 浮点 -> 16 位 PCM（向零截断，越界饱和）
pub fn float_to_pcm16(samples: &[f64]) -> Vec<i16> {
    samples.iter().map(|&x| (x * 32768.0) as i16).collect()
}
