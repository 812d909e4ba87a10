//! Dataset Context - 微调数据集切分
//!
//! 在单声道浮点样本上计算切分区间；解码、重采样与写文件由 CLI 负责。

use std::ops::Range;

/// 可切分的原始录音扩展名
pub const RECORDING_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a"];

/// 切分策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    /// 固定时长切分
    Fixed,
    /// 按静音切分后合并
    Silence,
}

/// 切分配置（时间单位：秒）
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub sample_rate: u32,
    /// 固定策略的块时长
    pub chunk_secs: f64,
    /// 短于该时长的块被丢弃
    pub min_chunk_secs: f64,
    /// 静音策略合并后的最大时长
    pub max_chunk_secs: f64,
    /// 判定静音的最小窗口
    pub silence_window_secs: f64,
    /// 静音阈值 (dBFS)
    pub silence_thresh_db: f64,
    pub seek_step_secs: f64,
    /// 非静音区两端保留的静音
    pub keep_silence_secs: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            chunk_secs: 15.0,
            min_chunk_secs: 5.0,
            max_chunk_secs: 30.0,
            silence_window_secs: 0.5,
            silence_thresh_db: -40.0,
            seek_step_secs: 0.01,
            keep_silence_secs: 0.2,
        }
    }
}

impl ChunkingConfig {
    fn samples(&self, secs: f64) -> usize {
        (secs * self.sample_rate as f64).round() as usize
    }
}

/// 一个输出块：由一个或多个样本区间拼接而成
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 输出文件编号（被丢弃的块也占用编号）
    pub index: usize,
    pub ranges: Vec<Range<usize>>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.ranges.iter().map(|r| r.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn extract(&self, samples: &[f32]) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len());
        for range in &self.ranges {
            out.extend_from_slice(&samples[range.clone()]);
        }
        out
    }

    /// 输出文件名 `{stem}_chunk_{NNN}.wav`
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}_chunk_{:03}.wav", stem, self.index)
    }
}

pub fn chunk_audio(samples: &[f32], strategy: ChunkStrategy, config: &ChunkingConfig) -> Vec<Chunk> {
    match strategy {
        ChunkStrategy::Fixed => fixed_chunks(samples.len(), config),
        ChunkStrategy::Silence => silence_chunks(samples, config),
    }
}

/// 固定时长切分，末尾不足最小时长的块丢弃
pub fn fixed_chunks(total: usize, config: &ChunkingConfig) -> Vec<Chunk> {
    let chunk_len = config.samples(config.chunk_secs).max(1);
    let min_len = config.samples(config.min_chunk_secs);

    (0..total.div_ceil(chunk_len))
        .map(|i| Chunk {
            index: i,
            ranges: vec![i * chunk_len..((i + 1) * chunk_len).min(total)],
        })
        .filter(|c| c.len() >= min_len)
        .collect()
}

/// 检测静音区间：窗口 RMS 不超过阈值即为静音
pub fn silent_ranges(samples: &[f32], config: &ChunkingConfig) -> Vec<Range<usize>> {
    let window = config.samples(config.silence_window_secs).max(1);
    let step = config.samples(config.seek_step_secs).max(1);
    let len = samples.len();
    if len < window {
        return Vec::new();
    }

    let threshold = 10f64.powf(config.silence_thresh_db / 20.0);

    // 平方前缀和，窗口 RMS O(1)
    let mut prefix = Vec::with_capacity(len + 1);
    prefix.push(0.0_f64);
    for &s in samples {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + (s as f64) * (s as f64));
    }
    let rms = |start: usize| ((prefix[start + window] - prefix[start]) / window as f64).sqrt();

    let last_start = len - window;
    let mut starts: Vec<usize> = (0..=last_start).step_by(step).collect();
    if last_start % step != 0 {
        starts.push(last_start);
    }
    let silent_starts: Vec<usize> = starts.into_iter().filter(|&i| rms(i) <= threshold).collect();

    let Some((&first, rest)) = silent_starts.split_first() else {
        return Vec::new();
    };

    let mut ranges = Vec::new();
    let mut range_start = first;
    let mut prev = first;
    for &start in rest {
        let continuous = start == prev + step;
        let has_gap = start > prev + window;
        if !continuous && has_gap {
            ranges.push(range_start..prev + window);
            range_start = start;
        }
        prev = start;
    }
    ranges.push(range_start..prev + window);
    ranges
}

/// 非静音区间（静音区间的补集）
pub fn nonsilent_ranges(samples: &[f32], config: &ChunkingConfig) -> Vec<Range<usize>> {
    let len = samples.len();
    let silent = silent_ranges(samples, config);
    if silent.is_empty() {
        return vec![0..len];
    }
    if silent[0] == (0..len) {
        return Vec::new();
    }

    let mut ranges = Vec::new();
    let mut prev_end = 0;
    for range in &silent {
        if range.start > prev_end {
            ranges.push(prev_end..range.start);
        }
        prev_end = range.end;
    }
    if prev_end < len {
        ranges.push(prev_end..len);
    }
    ranges
}

/// 非静音区间向两侧扩展保留静音；相邻区间重叠时在中点分界
pub fn split_on_silence(samples: &[f32], config: &ChunkingConfig) -> Vec<Range<usize>> {
    let keep = config.samples(config.keep_silence_secs) as i64;
    let len = samples.len() as i64;

    let mut padded: Vec<(i64, i64)> = nonsilent_ranges(samples, config)
        .into_iter()
        .map(|r| (r.start as i64 - keep, r.end as i64 + keep))
        .collect();

    for i in 1..padded.len() {
        let last_end = padded[i - 1].1;
        let next_start = padded[i].0;
        if next_start < last_end {
            let mid = (last_end + next_start) / 2;
            padded[i - 1].1 = mid;
            padded[i].0 = mid;
        }
    }

    padded
        .into_iter()
        .map(|(s, e)| (s.max(0) as usize)..(e.min(len) as usize))
        .collect()
}

/// 静音切分后合并：超长区间均分，相邻区间在不超过最大时长时拼接
pub fn silence_chunks(samples: &[f32], config: &ChunkingConfig) -> Vec<Chunk> {
    let max_len = config.samples(config.max_chunk_secs);
    let min_len = config.samples(config.min_chunk_secs);

    let mut groups: Vec<Vec<Range<usize>>> = Vec::new();
    let mut current: Vec<Range<usize>> = Vec::new();
    let current_len = |c: &Vec<Range<usize>>| c.iter().map(|r| r.len()).sum::<usize>();

    for range in split_on_silence(samples, config) {
        let range_len = range.len();
        if range_len > max_len {
            if current_len(&current) > 0 {
                groups.push(std::mem::take(&mut current));
            }
            let pieces = range_len / max_len + 1;
            let piece_len = range_len / pieces;
            for i in 0..pieces {
                let start = range.start + i * piece_len;
                let end = if i + 1 < pieces { start + piece_len } else { range.end };
                groups.push(vec![start..end]);
            }
        } else if current_len(&current) + range_len > max_len {
            groups.push(std::mem::replace(&mut current, vec![range]));
        } else {
            current.push(range);
        }
    }
    if current_len(&current) >= min_len {
        groups.push(current);
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(index, ranges)| Chunk { index, ranges })
        .filter(|c| c.len() >= min_len)
        .collect()
}

/// 取居中的 `window` 个样本；不足时返回全部
pub fn middle_window(len: usize, window: usize) -> Range<usize> {
    if len > window {
        let start = (len - window) / 2;
        start..start + window
    } else {
        0..len
    }
}

/// 参考样本选择：排序后的第 11 个块（跳过片头），不足时取第一个
pub fn reference_chunk_index(count: usize) -> Option<usize> {
    match count {
        0 => None,
        n if n > 10 => Some(10),
        _ => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChunkingConfig {
        ChunkingConfig {
            sample_rate: 1000,
            ..Default::default()
        }
    }

    fn signal(parts: &[(usize, f32)]) -> Vec<f32> {
        parts
            .iter()
            .flat_map(|&(n, v)| std::iter::repeat(v).take(n))
            .collect()
    }

    #[test]
    fn test_fixed_chunks_keep_long_tail() {
        let chunks = fixed_chunks(40_000, &config());
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].ranges, vec![30_000..40_000]);
        assert_eq!(chunks[1].file_name("book"), "book_chunk_001.wav");
    }

    #[test]
    fn test_fixed_chunks_drop_short_tail() {
        let chunks = fixed_chunks(33_000, &config());
        assert_eq!(chunks.len(), 2);
        assert!(fixed_chunks(4_000, &config()).is_empty());
    }

    #[test]
    fn test_nonsilent_ranges() {
        let samples = signal(&[(1000, 0.0), (2000, 0.5), (1000, 0.0)]);
        assert_eq!(silent_ranges(&samples, &config()), vec![0..1000, 3000..4000]);
        assert_eq!(nonsilent_ranges(&samples, &config()), vec![1000..3000]);
        assert_eq!(split_on_silence(&samples, &config()), vec![800..3200]);
    }

    #[test]
    fn test_all_silent_and_all_loud() {
        let quiet = signal(&[(3000, 0.0)]);
        assert!(nonsilent_ranges(&quiet, &config()).is_empty());
        assert!(silence_chunks(&quiet, &config()).is_empty());

        let loud = signal(&[(3000, 0.5)]);
        assert_eq!(nonsilent_ranges(&loud, &config()), vec![0..3000]);
    }

    #[test]
    fn test_silence_chunks_merge_regions() {
        let samples = signal(&[(8000, 0.5), (1000, 0.0), (8000, 0.5)]);
        let chunks = silence_chunks(&samples, &config());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].ranges, vec![0..8200, 8800..17000]);
        assert_eq!(chunks[0].extract(&samples).len(), 16_400);
    }

    #[test]
    fn test_silence_chunks_split_long_region() {
        let samples = signal(&[(70_000, 0.5)]);
        let chunks = silence_chunks(&samples, &config());
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].ranges, vec![0..23_333]);
        assert_eq!(chunks[2].ranges, vec![46_666..70_000]);
        assert_eq!(chunks[2].index, 2);
    }

    #[test]
    fn test_middle_window() {
        assert_eq!(middle_window(10, 6), 2..8);
        assert_eq!(middle_window(4, 6), 0..4);
    }

    #[test]
    fn test_reference_chunk_index() {
        assert_eq!(reference_chunk_index(0), None);
        assert_eq!(reference_chunk_index(5), Some(0));
        assert_eq!(reference_chunk_index(11), Some(10));
    }
}
