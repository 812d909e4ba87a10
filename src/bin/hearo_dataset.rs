//! hearo-dataset - 微调数据集准备工具
//!
//! - chunk: 长音频切分为训练片段
//! - extract-reference: 提取 6 秒参考音频
//! - transcribe: 调用兼容 OpenAI 的转写接口生成 metadata.csv

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use hearo_tts::domain::dataset::{
    chunk_audio, middle_window, reference_chunk_index, ChunkStrategy, ChunkingConfig,
    RECORDING_EXTENSIONS,
};
use hearo_tts::domain::dsp::{mix_to_mono, resample};
use hearo_tts::infrastructure::adapters::{decode_audio, write_wav_mono, DecodedAudio};

/// 训练数据集准备
#[derive(Parser, Debug)]
#[command(name = "hearo-dataset")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 日志级别（RUST_LOG 优先）
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split raw recordings into 16-bit mono WAV chunks
    Chunk(ChunkArgs),
    /// Cut a reference sample for voice cloning out of the processed chunks
    ExtractReference(ExtractArgs),
    /// Transcribe chunks and write metadata.csv
    Transcribe(TranscribeArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    Fixed,
    Silence,
}

impl From<Strategy> for ChunkStrategy {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Fixed => ChunkStrategy::Fixed,
            Strategy::Silence => ChunkStrategy::Silence,
        }
    }
}

#[derive(Args, Debug)]
struct ChunkArgs {
    /// Directory with the raw recordings
    #[arg(short, long, default_value = "raw-audio")]
    input: PathBuf,

    /// Output directory for chunks
    #[arg(short, long, default_value = "processed-audio")]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = Strategy::Silence)]
    strategy: Strategy,

    /// Target sample rate
    #[arg(long, default_value_t = 22050)]
    sample_rate: u32,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Directory with processed chunks
    #[arg(short, long, default_value = "processed-audio")]
    input: PathBuf,

    #[arg(short, long, default_value = "narrator-reference.wav")]
    output: PathBuf,

    /// Reference length in seconds
    #[arg(long, default_value_t = 6.0)]
    seconds: f64,
}

#[derive(Args, Debug)]
struct TranscribeArgs {
    /// Directory with processed chunks
    #[arg(short, long, default_value = "processed-audio")]
    input: PathBuf,

    /// Base URL of the transcription service
    #[arg(long, default_value = "http://localhost:8080")]
    url: String,

    /// Bearer token (falls back to OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    #[arg(long, default_value = "whisper-1")]
    model: String,

    #[arg(long, default_value = "en")]
    language: String,

    /// Value of the speaker_name column
    #[arg(long, default_value = "narrator")]
    speaker: String,

    #[arg(long, default_value = "transcripts")]
    transcripts_dir: PathBuf,

    #[arg(long, default_value = "metadata.csv")]
    metadata: PathBuf,

    /// Concurrent requests
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// 目录下扩展名匹配的文件（排序）
fn list_files(dir: &Path, extensions: &[&str]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| extensions.contains(&ext.as_str()));
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio")
        .to_string()
}

async fn decode_file(path: PathBuf) -> anyhow::Result<DecodedAudio> {
    let data = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    let decoded = tokio::task::spawn_blocking(move || decode_audio(data, extension.as_deref())).await??;
    Ok(decoded)
}

/// 解码并转换为目标采样率的单声道
async fn load_mono(path: &Path, sample_rate: u32) -> anyhow::Result<Vec<f32>> {
    let decoded = decode_file(path.to_path_buf()).await?;
    let resampled = tokio::task::spawn_blocking(move || {
        let mono = mix_to_mono(&decoded.samples, decoded.channels);
        resample(&mono, decoded.sample_rate, sample_rate)
    })
    .await??;
    Ok(resampled)
}

async fn run_chunk(args: ChunkArgs) -> anyhow::Result<()> {
    let files = list_files(&args.input, RECORDING_EXTENSIONS)?;
    if files.is_empty() {
        bail!("No audio files found in {}", args.input.display());
    }
    tokio::fs::create_dir_all(&args.output).await?;

    let config = ChunkingConfig {
        sample_rate: args.sample_rate,
        ..Default::default()
    };
    let strategy = ChunkStrategy::from(args.strategy);
    let mut total = 0usize;

    for path in &files {
        let samples = load_mono(path, args.sample_rate).await?;
        let stem = file_stem(path);
        let chunks = chunk_audio(&samples, strategy, &config);

        for chunk in &chunks {
            let out = args.output.join(chunk.file_name(&stem));
            let data = chunk.extract(&samples);
            let rate = args.sample_rate;
            tokio::task::spawn_blocking(move || write_wav_mono(&out, &data, rate)).await??;
        }

        tracing::info!(
            file = %path.display(),
            duration_secs = samples.len() as f64 / args.sample_rate as f64,
            chunks = chunks.len(),
            "Chunked recording"
        );
        total += chunks.len();
    }

    tracing::info!(files = files.len(), chunks = total, output = %args.output.display(), "Chunking complete");
    Ok(())
}

async fn run_extract_reference(args: ExtractArgs) -> anyhow::Result<()> {
    let files = list_files(&args.input, &["wav"])?;
    let source = reference_chunk_index(files.len())
        .map(|i| files[i].clone())
        .with_context(|| format!("No WAV chunks found in {}", args.input.display()))?;

    let decoded = decode_file(source.clone()).await?;
    let mono = mix_to_mono(&decoded.samples, decoded.channels);
    let window = (args.seconds * decoded.sample_rate as f64).round() as usize;
    let range = middle_window(mono.len(), window);
    write_wav_mono(&args.output, &mono[range.clone()], decoded.sample_rate)?;

    tracing::info!(
        source = %source.display(),
        output = %args.output.display(),
        duration_secs = range.len() as f64 / decoded.sample_rate as f64,
        "Reference sample created"
    );
    Ok(())
}

async fn transcribe_file(
    client: &reqwest::Client,
    args: &TranscribeArgs,
    api_key: Option<&str>,
    path: &Path,
) -> anyhow::Result<String> {
    let data = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio.wav")
        .to_string();

    let part = reqwest::multipart::Part::bytes(data)
        .file_name(file_name)
        .mime_str("audio/wav")?;
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("model", args.model.clone())
        .text("language", args.language.clone())
        .text("response_format", "json");

    let endpoint = format!("{}/v1/audio/transcriptions", args.url.trim_end_matches('/'));
    let mut request = client.post(&endpoint).multipart(form);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let response = request.send().await?.error_for_status()?;
    let body: TranscriptionResponse = response.json().await?;
    Ok(body.text.trim().to_string())
}

/// metadata.csv 的一行：`audio_file|text|speaker_name`
fn metadata_line(audio_file: &str, text: &str, speaker: &str) -> String {
    let clean = |s: &str| s.replace(['|', '\n', '\r'], " ");
    format!("{}|{}|{}", clean(audio_file), clean(text).trim(), clean(speaker))
}

fn render_metadata(rows: &[(String, String)], speaker: &str) -> String {
    let mut out = String::from("audio_file|text|speaker_name\n");
    for (audio_file, text) in rows {
        out.push_str(&metadata_line(audio_file, text, speaker));
        out.push('\n');
    }
    out
}

async fn run_transcribe(args: TranscribeArgs) -> anyhow::Result<()> {
    let files = list_files(&args.input, &["wav"])?;
    if files.is_empty() {
        bail!("No WAV chunks found in {}", args.input.display());
    }
    tokio::fs::create_dir_all(&args.transcripts_dir).await?;

    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok());
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;

    tracing::info!(files = files.len(), url = %args.url, model = %args.model, "Transcribing chunks");

    let results = stream::iter(files.iter())
        .map(|path| {
            let client = &client;
            let args = &args;
            let api_key = api_key.as_deref();
            async move { (path, transcribe_file(client, args, api_key, path).await) }
        })
        .buffer_unordered(args.concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    let mut rows = Vec::new();
    let mut failed = 0usize;
    for (path, result) in results {
        match result {
            Ok(text) => {
                let transcript = args.transcripts_dir.join(format!("{}.txt", file_stem(path)));
                tokio::fs::write(&transcript, &text).await?;
                rows.push((path.display().to_string(), text));
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(file = %path.display(), error = %e, "Transcription failed, skipping");
            }
        }
    }
    rows.sort();

    tokio::fs::write(&args.metadata, render_metadata(&rows, &args.speaker)).await?;

    tracing::info!(
        transcribed = rows.len(),
        failed,
        metadata = %args.metadata.display(),
        "Transcription complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    match cli.command {
        Command::Chunk(args) => run_chunk(args).await,
        Command::ExtractReference(args) => run_extract_reference(args).await,
        Command::Transcribe(args) => run_transcribe(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_rendering() {
        let rows = vec![
            ("processed-audio/a_chunk_000.wav".to_string(), " Hello | world\n".to_string()),
            ("processed-audio/a_chunk_001.wav".to_string(), "Second.".to_string()),
        ];
        let csv = render_metadata(&rows, "narrator");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "audio_file|text|speaker_name");
        assert_eq!(lines[1], "processed-audio/a_chunk_000.wav|Hello   world|narrator");
        assert_eq!(lines[2], "processed-audio/a_chunk_001.wav|Second.|narrator");
    }

    #[test]
    fn test_list_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.wav", "a.mp3", "c.txt", "d.WAV", "e.m4a"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let all = list_files(dir.path(), RECORDING_EXTENSIONS).unwrap();
        let names: Vec<_> = all.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, vec!["a.mp3", "b.wav", "d.WAV", "e.m4a"]);

        assert_eq!(list_files(dir.path(), &["wav"]).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_chunk_and_extract_reference() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw");
        let processed = dir.path().join("processed");
        std::fs::create_dir(&raw).unwrap();

        // 40 秒 16kHz 正弦音，固定策略 -> 15s + 15s + 10s
        let samples: Vec<f32> = (0..16000 * 40)
            .map(|i| (i as f32 * 0.05).sin() * 0.3)
            .collect();
        write_wav_mono(&raw.join("book.wav"), &samples, 16000).unwrap();

        run_chunk(ChunkArgs {
            input: raw,
            output: processed.clone(),
            strategy: Strategy::Fixed,
            sample_rate: 22050,
        })
        .await
        .unwrap();

        let chunks = list_files(&processed, &["wav"]).unwrap();
        let names: Vec<_> = chunks.iter().map(|p| file_stem(p)).collect();
        assert_eq!(names, vec!["book_chunk_000", "book_chunk_001", "book_chunk_002"]);

        let reference = dir.path().join("ref.wav");
        run_extract_reference(ExtractArgs {
            input: processed,
            output: reference.clone(),
            seconds: 6.0,
        })
        .await
        .unwrap();

        let reader = hound::WavReader::open(&reference).unwrap();
        assert_eq!(reader.spec().sample_rate, 22050);
        assert_eq!(reader.duration(), 6 * 22050);
    }
}
