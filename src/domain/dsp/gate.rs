//! 平滑噪声门

/// 居中滑动平均，输出与输入等长（等价于 "same" 模式卷积）
pub fn moving_average_same(input: &[f64], kernel_size: usize) -> Vec<f64> {
    if kernel_size == 0 {
        return input.to_vec();
    }

    let len = input.len();
    let mut prefix = Vec::with_capacity(len + 1);
    prefix.push(0.0);
    for &v in input {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + v);
    }

    let offset = (kernel_size - 1) / 2;
    let scale = 1.0 / kernel_size as f64;

    (0..len)
        .map(|i| {
            // 窗口 [i + offset - (k - 1), i + offset]，越界部分按 0 计
            let hi = (i + offset).min(len - 1);
            let lo = (i + offset).saturating_sub(kernel_size - 1);
            if lo > hi {
                0.0
            } else {
                (prefix[hi + 1] - prefix[lo]) * scale
            }
        })
        .collect()
}

/// 生成平滑门限掩码：|x| > threshold 的位置为 1，再做滑动平均
pub fn smooth_gate(signal: &[f64], threshold: f64, kernel_size: usize) -> Vec<f64> {
    let mask: Vec<f64> = signal
        .iter()
        .map(|x| if x.abs() > threshold { 1.0 } else { 0.0 })
        .collect();
    moving_average_same(&mask, kernel_size)
}
