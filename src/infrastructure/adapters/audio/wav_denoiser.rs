//! WAV Denoiser - 16 位 PCM WAV 文件原地降噪
//!
//! 实现 AudioProcessorPort：读取、逐声道降噪、写入同目录临时文件后重命名覆盖。
//! CPU 密集部分运行在 `spawn_blocking` 上。

use async_trait::async_trait;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::application::ports::{AudioProcessorPort, DenoiseError};
use crate::domain::dsp::{denoise_channels, float_to_pcm16, pcm16_to_float, DenoiseParams, DenoiseReport};

#[derive(Debug, Clone, Default)]
pub struct WavDenoiser;

impl WavDenoiser {
    pub fn new() -> Self {
        Self
    }
}

fn format_err(e: hound::Error) -> DenoiseError {
    match e {
        hound::Error::IoError(io) => DenoiseError::Io(io.to_string()),
        other => DenoiseError::Format(other.to_string()),
    }
}

fn denoise_file(path: &Path, strength: f32) -> Result<DenoiseReport, DenoiseError> {
    let mut reader = hound::WavReader::open(path).map_err(format_err)?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(DenoiseError::Format(format!(
            "expected 16-bit PCM, got {:?} {}-bit",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let interleaved: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<_, _>>()
        .map_err(format_err)?;
    drop(reader);

    let channels = spec.channels.max(1) as usize;
    let planar: Vec<Vec<f64>> = (0..channels)
        .map(|ch| {
            let channel: Vec<i16> = interleaved.iter().skip(ch).step_by(channels).copied().collect();
            pcm16_to_float(&channel)
        })
        .collect();

    let (processed, report) =
        denoise_channels(&planar, DenoiseParams::new(strength as f64, spec.sample_rate))?;
    let pcm: Vec<Vec<i16>> = processed.iter().map(|c| float_to_pcm16(c)).collect();

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| DenoiseError::Io(e.to_string()))?;
    {
        let mut writer =
            hound::WavWriter::new(BufWriter::new(tmp.as_file()), spec).map_err(format_err)?;
        let frames = pcm.first().map_or(0, |c| c.len());
        for i in 0..frames {
            for channel in &pcm {
                writer.write_sample(channel[i]).map_err(format_err)?;
            }
        }
        writer.finalize().map_err(format_err)?;
    }
    tmp.persist(path)
        .map_err(|e| DenoiseError::Io(e.error.to_string()))?;

    Ok(report)
}

#[async_trait]
impl AudioProcessorPort for WavDenoiser {
    async fn denoise(&self, path: &Path, strength: f32) -> Result<Option<DenoiseReport>, DenoiseError> {
        if strength <= 0.0 {
            return Ok(None);
        }

        let path: PathBuf = path.to_path_buf();
        let report = tokio::task::spawn_blocking(move || denoise_file(&path, strength))
            .await
            .map_err(|e| DenoiseError::Io(format!("denoise task failed: {}", e)))??;

        tracing::debug!(
            strength,
            cutoff_hz = report.cutoff_hz,
            peak = report.peak,
            "WAV denoised"
        );
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_wav(path: &Path, channels: u16, rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let t = i as f32 / rate as f32;
            let value = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.4;
            for _ in 0..channels {
                writer.write_sample((value * 32767.0) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[tokio::test]
    async fn test_zero_strength_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.wav");
        write_wav(&path, 1, 22050, 4410);
        let before = std::fs::read(&path).unwrap();

        let report = WavDenoiser::new().denoise(&path, 0.0).await.unwrap();
        assert!(report.is_none());
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_denoise_preserves_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, 22050, 11025);

        let report = WavDenoiser::new().denoise(&path, 0.02).await.unwrap();
        assert!(report.is_some());

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.duration(), 11025);

        // 临时文件已被重命名，不留残余
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_failure_leaves_original() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.wav");
        write_wav(&path, 1, 22050, 10);
        let before = std::fs::read(&path).unwrap();

        let err = WavDenoiser::new().denoise(&path, 0.5).await.unwrap_err();
        assert!(matches!(err, DenoiseError::Dsp(_)));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_rejects_float_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(0.1f32).unwrap();
        }
        writer.finalize().unwrap();

        let err = WavDenoiser::new().denoise(&path, 0.1).await.unwrap_err();
        assert!(matches!(err, DenoiseError::Format(_)));
    }
}
