//! IIR 滤波器 - Butterworth 设计与零相位滤波
//!
//! 设计流程：模拟原型 -> 高通变换 -> 预畸变双线性变换 -> 传递函数 (b, a)
//! 零相位滤波采用前向-反向两次 lfilter，奇延拓填充并使用稳态初始条件。

use std::ops::{Add, Div, Mul, Neg, Sub};

use super::DspError;

/// 传递函数系数，`a[0]` 归一化为 1
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

impl TransferFunction {
    /// filtfilt 默认填充长度
    pub fn default_padlen(&self) -> usize {
        3 * self.a.len().max(self.b.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Complex {
    re: f64,
    im: f64,
}

impl Complex {
    const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    const fn real(re: f64) -> Self {
        Self { re, im: 0.0 }
    }

    fn from_polar(r: f64, theta: f64) -> Self {
        Self::new(r * theta.cos(), r * theta.sin())
    }
}

impl Add for Complex {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl Div for Complex {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        let denom = rhs.re * rhs.re + rhs.im * rhs.im;
        Self::new(
            (self.re * rhs.re + self.im * rhs.im) / denom,
            (self.im * rhs.re - self.re * rhs.im) / denom,
        )
    }
}

impl Neg for Complex {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.re, -self.im)
    }
}

/// 由根展开多项式系数（最高次在前）
fn poly(roots: &[Complex]) -> Vec<Complex> {
    let mut coeffs = vec![Complex::real(1.0)];
    for &root in roots {
        let mut next = vec![Complex::real(0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] = next[i] + c;
            next[i + 1] = next[i + 1] - c * root;
        }
        coeffs = next;
    }
    coeffs
}

fn product(values: impl Iterator<Item = Complex>) -> Complex {
    values.fold(Complex::real(1.0), |acc, v| acc * v)
}

/// 设计 N 阶 Butterworth 高通滤波器
///
/// `normalized_cutoff` 为相对 Nyquist 频率的截止频率，取值 (0, 1)。
pub fn butter_highpass(order: usize, normalized_cutoff: f64) -> Result<TransferFunction, DspError> {
    if order == 0 {
        return Err(DspError::InvalidFilter("order must be positive".to_string()));
    }
    if !(normalized_cutoff > 0.0 && normalized_cutoff < 1.0) {
        return Err(DspError::InvalidFilter(format!(
            "normalized cutoff must be in (0, 1), got {}",
            normalized_cutoff
        )));
    }

    // 模拟低通原型极点（单位圆左半平面）
    let n = order as f64;
    let prototype: Vec<Complex> = (0..order)
        .map(|k| {
            let m = -(n - 1.0) + 2.0 * k as f64;
            -Complex::from_polar(1.0, std::f64::consts::PI * m / (2.0 * n))
        })
        .collect();

    // 预畸变（采样率归一化为 2）
    let fs = 2.0;
    let warped = Complex::real(2.0 * fs * (std::f64::consts::PI * normalized_cutoff / fs).tan());

    // 低通 -> 高通：零点全部移到原点
    let hp_poles: Vec<Complex> = prototype.iter().map(|&p| warped / p).collect();
    let hp_zeros = vec![Complex::real(0.0); order];
    let hp_gain = (Complex::real(1.0) / product(prototype.iter().map(|&p| -p))).re;

    // 双线性变换
    let fs2 = Complex::real(2.0 * fs);
    let z_zeros: Vec<Complex> = hp_zeros.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
    let z_poles: Vec<Complex> = hp_poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();
    let z_gain = hp_gain
        * (product(hp_zeros.iter().map(|&z| fs2 - z)) / product(hp_poles.iter().map(|&p| fs2 - p)))
            .re;

    let b = poly(&z_zeros).into_iter().map(|c| c.re * z_gain).collect();
    let a = poly(&z_poles).into_iter().map(|c| c.re).collect();

    Ok(TransferFunction { b, a })
}

/// 直接 II 型转置结构的 IIR 滤波，`zi` 为初始状态
pub fn lfilter(tf: &TransferFunction, input: &[f64], zi: Option<&[f64]>) -> Vec<f64> {
    let n = tf.a.len().max(tf.b.len());
    let a0 = tf.a[0];
    let coeff = |v: &[f64], i: usize| v.get(i).copied().unwrap_or(0.0) / a0;

    let mut state = vec![0.0; n.saturating_sub(1)];
    if let Some(zi) = zi {
        for (s, z) in state.iter_mut().zip(zi) {
            *s = *z;
        }
    }

    let mut output = Vec::with_capacity(input.len());
    for &x in input {
        let y = coeff(&tf.b, 0) * x + state.first().copied().unwrap_or(0.0);
        for i in 0..state.len() {
            let next = state.get(i + 1).copied().unwrap_or(0.0);
            state[i] = coeff(&tf.b, i + 1) * x + next - coeff(&tf.a, i + 1) * y;
        }
        output.push(y);
    }
    output
}

/// 阶跃响应稳态的初始条件
pub fn lfilter_zi(tf: &TransferFunction) -> Result<Vec<f64>, DspError> {
    let n = tf.a.len().max(tf.b.len());
    if n < 2 {
        return Ok(Vec::new());
    }
    let a0 = tf.a[0];
    let a: Vec<f64> = (0..n).map(|i| tf.a.get(i).copied().unwrap_or(0.0) / a0).collect();
    let b: Vec<f64> = (0..n).map(|i| tf.b.get(i).copied().unwrap_or(0.0) / a0).collect();

    // (I - companion(a)^T) zi = b[1:] - a[1:] * b[0]
    let dim = n - 1;
    let mut matrix = vec![vec![0.0; dim]; dim];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[i] += 1.0;
        row[0] += a[i + 1];
        if i + 1 < dim {
            row[i + 1] -= 1.0;
        }
    }
    let rhs: Vec<f64> = (0..dim).map(|i| b[i + 1] - a[i + 1] * b[0]).collect();

    solve_linear(matrix, rhs)
}

/// 部分主元高斯消元
fn solve_linear(mut m: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Result<Vec<f64>, DspError> {
    let n = rhs.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&x, &y| m[x][col].abs().total_cmp(&m[y][col].abs()))
            .unwrap_or(col);
        if m[pivot][col].abs() < f64::EPSILON {
            return Err(DspError::InvalidFilter("singular initial-condition system".to_string()));
        }
        m.swap(col, pivot);
        rhs.swap(col, pivot);

        let pivot_row = m[col].clone();
        let pivot_rhs = rhs[col];
        for row in (col + 1)..n {
            let factor = m[row][col] / pivot_row[col];
            for k in col..n {
                m[row][k] -= factor * pivot_row[k];
            }
            rhs[row] -= factor * pivot_rhs;
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| m[row][k] * x[k]).sum();
        x[row] = (rhs[row] - tail) / m[row][row];
    }
    Ok(x)
}

/// 奇延拓：两端各镜像 `padlen` 个样本并关于端点取反
fn odd_extend(input: &[f64], padlen: usize) -> Vec<f64> {
    let first = input[0];
    let last = input[input.len() - 1];
    let len = input.len();

    let mut ext = Vec::with_capacity(len + 2 * padlen);
    ext.extend((1..=padlen).rev().map(|i| 2.0 * first - input[i]));
    ext.extend_from_slice(input);
    ext.extend((1..=padlen).map(|i| 2.0 * last - input[len - 1 - i]));
    ext
}

/// 零相位滤波（前向 + 反向）
///
/// 信号长度必须大于填充长度 `3 * max(len(a), len(b))`。
pub fn filtfilt(tf: &TransferFunction, input: &[f64]) -> Result<Vec<f64>, DspError> {
    let padlen = tf.default_padlen();
    if input.len() <= padlen {
        return Err(DspError::SignalTooShort {
            len: input.len(),
            padlen,
        });
    }

    let zi = lfilter_zi(tf)?;
    let ext = odd_extend(input, padlen);

    let scaled: Vec<f64> = zi.iter().map(|z| z * ext[0]).collect();
    let mut forward = lfilter(tf, &ext, Some(&scaled));

    forward.reverse();
    let scaled: Vec<f64> = zi.iter().map(|z| z * forward[0]).collect();
    let mut backward = lfilter(tf, &forward, Some(&scaled));
    backward.reverse();

    Ok(backward[padlen..backward.len() - padlen].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < tol, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_butter_highpass_order2_half_band() {
        // 二阶、截止 0.5 的高通：b = [0.2929, -0.5858, 0.2929], a = [1, 0, 0.1716]
        let tf = butter_highpass(2, 0.5).unwrap();
        assert_close(&tf.b, &[0.292_893_2, -0.585_786_4, 0.292_893_2], 1e-6);
        assert_close(&tf.a, &[1.0, 0.0, 0.171_572_9], 1e-6);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let tf = butter_highpass(4, 0.1).unwrap();
        // 直流增益 sum(b)/sum(a) 为 0
        let dc: f64 = tf.b.iter().sum::<f64>() / tf.a.iter().sum::<f64>();
        assert!(dc.abs() < 1e-9);
        // Nyquist 增益为 1
        let alt = |v: &[f64]| -> f64 {
            v.iter()
                .enumerate()
                .map(|(i, c)| if i % 2 == 0 { *c } else { -*c })
                .sum()
        };
        assert!((alt(&tf.b) / alt(&tf.a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_cutoff_rejected() {
        assert!(butter_highpass(4, 0.0).is_err());
        assert!(butter_highpass(4, 1.0).is_err());
        assert!(butter_highpass(0, 0.5).is_err());
    }

    #[test]
    fn test_lfilter_zi_gives_steady_state() {
        let tf = butter_highpass(4, 0.2).unwrap();
        let zi = lfilter_zi(&tf).unwrap();
        // 对常数输入从稳态出发，高通输出恒为 0
        let out = lfilter(&tf, &[1.0; 64], Some(&zi));
        assert!(out.iter().all(|y| y.abs() < 1e-9));
    }

    #[test]
    fn test_filtfilt_removes_constant_offset() {
        let tf = butter_highpass(4, 0.05).unwrap();
        let input = vec![0.3; 500];
        let out = filtfilt(&tf, &input).unwrap();
        assert_eq!(out.len(), input.len());
        assert!(out.iter().all(|y| y.abs() < 1e-6));
    }

    #[test]
    fn test_filtfilt_short_signal() {
        let tf = butter_highpass(4, 0.05).unwrap();
        let err = filtfilt(&tf, &[0.0; 15]).unwrap_err();
        assert!(matches!(err, DspError::SignalTooShort { len: 15, padlen: 15 }));
    }

    #[test]
    fn test_filtfilt_keeps_high_frequency() {
        let tf = butter_highpass(4, 0.05).unwrap();
        // Nyquist 附近的交替信号基本无衰减
        let input: Vec<f64> = (0..400).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        let out = filtfilt(&tf, &input).unwrap();
        let mid = &out[150..250];
        assert!(mid.iter().all(|y| (y.abs() - 0.5).abs() < 1e-3));
    }
}
