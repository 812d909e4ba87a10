//! Domain Layer - 领域层
//!
//! - Speech Context: 合成参数与参考音频命名
//! - Audio Post-Processing: 文本预处理、降噪 DSP
//! - Dataset Context: 微调数据集切分

pub mod dataset;
pub mod dsp;
pub mod speech;

mod text_normalizer;

pub use text_normalizer::normalize_text;
