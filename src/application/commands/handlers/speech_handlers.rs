//! Speech Command Handlers
//!
//! 合成流程：校验 -> 文本预处理 -> 解析音色 -> 推理 -> 降噪 -> 母带 -> 编码
//! 降噪与母带失败只记录警告，不影响响应

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::application::commands::{GenerateSpeech, GeneratedSpeech, VoiceSource};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioProcessorPort, MediaFilterPort, ScratchStoragePort, SynthesisRequest, TtsEnginePort,
    VoiceReference, VoiceStorePort,
};
use crate::domain::normalize_text;
use crate::domain::speech::{require_text, OutputFormat};

/// 后处理设置
#[derive(Debug, Clone)]
pub struct PostProcessSettings {
    /// 默认是否母带处理（请求可覆盖）
    pub mastering_enabled: bool,
    /// 无法从 WAV 头读取时使用的采样率
    pub sample_rate: u32,
}

impl Default for PostProcessSettings {
    fn default() -> Self {
        Self {
            mastering_enabled: false,
            sample_rate: 22050,
        }
    }
}

/// GenerateSpeech Handler
pub struct GenerateSpeechHandler {
    engine: Arc<dyn TtsEnginePort>,
    voice_store: Arc<dyn VoiceStorePort>,
    scratch: Arc<dyn ScratchStoragePort>,
    processor: Arc<dyn AudioProcessorPort>,
    media_filter: Arc<dyn MediaFilterPort>,
    settings: PostProcessSettings,
}

impl GenerateSpeechHandler {
    pub fn new(
        engine: Arc<dyn TtsEnginePort>,
        voice_store: Arc<dyn VoiceStorePort>,
        scratch: Arc<dyn ScratchStoragePort>,
        processor: Arc<dyn AudioProcessorPort>,
        media_filter: Arc<dyn MediaFilterPort>,
        settings: PostProcessSettings,
    ) -> Self {
        Self {
            engine,
            voice_store,
            scratch,
            processor,
            media_filter,
            settings,
        }
    }

    pub async fn handle(&self, command: GenerateSpeech) -> Result<GeneratedSpeech, ApplicationError> {
        let GenerateSpeech {
            text,
            params,
            voice,
        } = command;

        let text = require_text(Some(text.as_str()))?;
        params.validate()?;

        let normalized = normalize_text(text);
        let voice_ref = self.resolve_voice(voice).await?;

        tracing::info!(
            text_len = normalized.len(),
            language = %params.language,
            voice = voice_ref.as_ref().map(|v| v.name.as_str()).unwrap_or(params.speaker.as_str()),
            exaggeration = params.exaggeration,
            cfg_weight = params.cfg_weight,
            "Generating speech"
        );
        tracing::debug!(text = %normalized, "Normalized text");

        let started = Instant::now();
        let output = self
            .engine
            .synthesize(SynthesisRequest {
                text: normalized,
                language: params.language.clone(),
                speaker: params.speaker.clone(),
                exaggeration: params.exaggeration,
                cfg_weight: params.cfg_weight,
                temperature: params.temperature,
                speed: params.speed,
                voice_ref,
            })
            .await?;
        let generation_time = started.elapsed();

        let wav_file = self.scratch.create_file("output_", "wav").await?;
        tokio::fs::write(wav_file.path(), &output.audio_data).await?;

        if params.denoiser_strength > 0.0 {
            self.denoise(wav_file.path(), params.denoiser_strength).await;
        }

        if params.master.unwrap_or(self.settings.mastering_enabled) {
            if let Err(e) = self.media_filter.master(wav_file.path()).await {
                tracing::warn!(error = %e, "Mastering skipped");
            }
        }

        let wav = tokio::fs::read(wav_file.path()).await?;
        let sample_rate = wav_sample_rate(&wav)
            .or(output.sample_rate)
            .unwrap_or(self.settings.sample_rate);

        let (audio, format) = match params.output_format {
            OutputFormat::Wav => (wav, OutputFormat::Wav),
            OutputFormat::Mp3 => match self.encode_mp3(wav_file.path()).await {
                Ok(mp3) => (mp3, OutputFormat::Mp3),
                Err(e) => {
                    tracing::warn!(error = %e, "MP3 conversion failed, returning WAV");
                    (wav, OutputFormat::Wav)
                }
            },
        };

        tracing::info!(
            generation_secs = generation_time.as_secs_f64(),
            audio_size = audio.len(),
            format = %format,
            sample_rate,
            "Speech generated"
        );

        Ok(GeneratedSpeech {
            audio,
            format,
            sample_rate,
            language: params.language,
            generation_time,
        })
    }

    async fn resolve_voice(&self, voice: VoiceSource) -> Result<Option<VoiceReference>, ApplicationError> {
        match voice {
            VoiceSource::BuiltIn => Ok(None),
            VoiceSource::Stored(name) => {
                let data = self
                    .voice_store
                    .load(&name)
                    .await?
                    .ok_or_else(|| ApplicationError::not_found("Voice reference", name.as_str()))?;
                Ok(Some(VoiceReference {
                    name: name.to_string(),
                    data,
                }))
            }
            VoiceSource::Inline { name, data } => {
                if data.is_empty() {
                    return Err(ApplicationError::validation("Speaker audio is empty"));
                }
                Ok(Some(VoiceReference { name, data }))
            }
        }
    }

    async fn denoise(&self, path: &Path, strength: f32) {
        match self.processor.denoise(path, strength).await {
            Ok(Some(report)) => tracing::debug!(
                strength,
                cutoff_hz = report.cutoff_hz,
                gate_threshold = report.gate_threshold,
                "Denoise applied"
            ),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, strength, "Denoise skipped"),
        }
    }

    async fn encode_mp3(&self, wav: &Path) -> Result<Vec<u8>, ApplicationError> {
        let mp3_file = self.scratch.create_file("output_", "mp3").await?;
        self.media_filter
            .encode_mp3(wav, mp3_file.path())
            .await
            .map_err(|e| ApplicationError::internal(e.to_string()))?;
        Ok(tokio::fs::read(mp3_file.path()).await?)
    }
}

fn wav_sample_rate(bytes: &[u8]) -> Option<u32> {
    hound::WavReader::new(Cursor::new(bytes))
        .ok()
        .map(|reader| reader.spec().sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{SynthesisOutput, TtsError};
    use crate::domain::speech::{GenerationParams, VoiceFileName};
    use crate::infrastructure::adapters::{
        FakeTtsClient, FileScratchStorage, FileVoiceStore, NoopMediaFilter, WavDenoiser,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// 记录调用次数并返回固定音频的引擎
    struct CountingEngine {
        inner: FakeTtsClient,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TtsEnginePort for CountingEngine {
        async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisOutput, TtsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.synthesize(request).await
        }

        fn model_name(&self) -> String {
            "counting".to_string()
        }
    }

    struct Fixture {
        _dir: TempDir,
        engine: Arc<CountingEngine>,
        voices: Arc<FileVoiceStore>,
        handler: GenerateSpeechHandler,
        scratch_dir: std::path::PathBuf,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let scratch_dir = dir.path().join("scratch");
        let engine = Arc::new(CountingEngine {
            inner: FakeTtsClient::default(),
            calls: AtomicUsize::new(0),
        });
        let voices = Arc::new(FileVoiceStore::new(dir.path().join("voices")).await.unwrap());
        let scratch = Arc::new(FileScratchStorage::new(&scratch_dir).await.unwrap());
        let handler = GenerateSpeechHandler::new(
            engine.clone(),
            voices.clone(),
            scratch,
            Arc::new(WavDenoiser::new()),
            Arc::new(NoopMediaFilter),
            PostProcessSettings::default(),
        );
        Fixture {
            _dir: dir,
            engine,
            voices,
            handler,
            scratch_dir,
        }
    }

    fn command(text: &str) -> GenerateSpeech {
        GenerateSpeech {
            text: text.to_string(),
            params: GenerationParams::default(),
            voice: VoiceSource::BuiltIn,
        }
    }

    #[tokio::test]
    async fn test_generate_returns_wav() {
        let f = fixture().await;
        let speech = f.handler.handle(command("Hello there. How are you?")).await.unwrap();

        assert_eq!(speech.format, OutputFormat::Wav);
        assert_eq!(speech.sample_rate, 22050);
        assert_eq!(&speech.audio[0..4], b"RIFF");
        assert_eq!(f.engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scratch_files_removed_after_request() {
        let f = fixture().await;
        f.handler.handle(command("Some words to speak.")).await.unwrap();

        let leftover = std::fs::read_dir(&f.scratch_dir).unwrap().count();
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn test_blank_text_rejected_before_model_call() {
        let f = fixture().await;
        let err = f.handler.handle(command("   ")).await.unwrap_err();

        assert!(matches!(err, ApplicationError::Validation(_)));
        assert_eq!(f.engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_knob_rejected_before_model_call() {
        let f = fixture().await;
        let mut cmd = command("Hello");
        cmd.params.cfg_weight = 1.2;

        let err = f.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(_)));
        assert_eq!(f.engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_stored_voice_is_not_found() {
        let f = fixture().await;
        let mut cmd = command("Hello");
        cmd.voice = VoiceSource::Stored(VoiceFileName::parse("voice_1_missing.wav").unwrap());

        let err = f.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_stored_voice_is_used() {
        let f = fixture().await;
        let stored = f.voices.save("narrator.wav", b"RIFF-ish").await.unwrap();
        let mut cmd = command("Hello");
        cmd.voice = VoiceSource::Stored(VoiceFileName::parse(&stored.file_name).unwrap());

        assert!(f.handler.handle(cmd).await.is_ok());
    }

    #[tokio::test]
    async fn test_mp3_falls_back_to_wav_without_encoder() {
        let f = fixture().await;
        let mut cmd = command("Hello");
        cmd.params.output_format = OutputFormat::Mp3;

        let speech = f.handler.handle(cmd).await.unwrap();
        assert_eq!(speech.format, OutputFormat::Wav);
        assert_eq!(&speech.audio[0..4], b"RIFF");
    }

    #[test]
    fn test_wav_sample_rate_of_garbage() {
        assert_eq!(wav_sample_rate(b"not a wav"), None);
    }
}
