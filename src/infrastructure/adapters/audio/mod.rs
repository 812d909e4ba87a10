//! Audio Adapter - 本地音频编解码与降噪

mod codec;
mod wav_denoiser;

pub use codec::{decode_audio, write_wav_mono, CodecError, DecodedAudio};
pub use wav_denoiser::WavDenoiser;
