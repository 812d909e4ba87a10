//! 声道混合与带限重采样

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use super::DspError;

/// 交错多声道样本取平均混为单声道
pub fn mix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// 单声道 sinc 重采样，降采样时先滤除新 Nyquist 以上的成分
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, DspError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(DspError::InvalidParameter(format!(
            "sample rate must be positive: {} -> {}",
            from_rate, to_rate
        )));
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = to_rate as f64 / from_rate as f64;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, samples.len(), 1)
        .map_err(|e| DspError::Resample(e.to_string()))?;
    let waves_in = vec![samples.to_vec()];
    let waves_out = resampler
        .process(&waves_in, None)
        .map_err(|e| DspError::Resample(e.to_string()))?;

    Ok(waves_out.into_iter().next().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, rate: u32, secs: f32) -> Vec<f32> {
        let n = (rate as f32 * secs) as usize;
        (0..n)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    /// 去掉两端滤波器过渡区后的 RMS
    fn inner_rms(samples: &[f32]) -> f32 {
        let margin = samples.len() / 10;
        let inner = &samples[margin..samples.len() - margin];
        (inner.iter().map(|s| s * s).sum::<f32>() / inner.len() as f32).sqrt()
    }

    #[test]
    fn test_mix_to_mono() {
        assert_eq!(mix_to_mono(&[1.0, 0.0, 0.5, 0.5], 2), vec![0.5, 0.5]);
        assert_eq!(mix_to_mono(&[0.2, 0.4], 1), vec![0.2, 0.4]);
    }

    #[test]
    fn test_resample_length() {
        let input = vec![0.0; 44100];
        let out = resample(&input, 44100, 22050).unwrap();
        assert!((out.len() as i64 - 22050).abs() <= 220, "len = {}", out.len());
        assert_eq!(resample(&input, 22050, 22050).unwrap().len(), 44100);
    }

    #[test]
    fn test_resample_empty_and_zero_rate() {
        assert!(resample(&[], 44100, 22050).unwrap().is_empty());
        assert!(matches!(
            resample(&[0.1, 0.2], 0, 22050),
            Err(DspError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_downsample_removes_content_above_nyquist() {
        let tone = sine(15_000.0, 44100, 1.0);
        let out = resample(&tone, 44100, 22050).unwrap();
        assert!(inner_rms(&out) < 0.02, "aliased rms = {}", inner_rms(&out));
    }

    #[test]
    fn test_downsample_keeps_passband() {
        let tone = sine(1_000.0, 48000, 1.0);
        let out = resample(&tone, 48000, 22050).unwrap();
        let rms = inner_rms(&out);
        assert!((rms - 0.5 / 2f32.sqrt()).abs() < 0.03, "rms = {}", rms);
    }
}
