//! 文本预处理
//!
//! 在送入 TTS 模型之前改写标点与空白，让模型在句末和长从句处产生停顿。
//! 纯函数，不保证幂等（重复应用可能插入多余逗号，由清理规则部分合并）。

use regex::Regex;
use std::sync::LazyLock;

/// 句末/分句标点后插入逗号停顿：(模式, 替换)
static PAUSE_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\.\s+", "., "),
        (r"!\s+", "!, "),
        (r"\?\s+", "?, "),
        (r":\s+", ":, "),
        (r";\s+", ";, "),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (compile(pattern), replacement))
    .collect()
});

static COMMA_SPACING: LazyLock<Regex> = LazyLock::new(|| compile(r",\s*"));
static AND_CLAUSE: LazyLock<Regex> = LazyLock::new(|| compile(r"(\w+)\s+and\s+(\w+)"));
static DUPLICATE_COMMAS: LazyLock<Regex> = LazyLock::new(|| compile(r",\s*,+"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s+"));

fn compile(pattern: &str) -> Regex {
    // 模式均为编译期常量
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid normalizer pattern {pattern}: {e}"))
}

/// 文本预处理
///
/// 1. `. ! ? : ;` 后若跟空白，插入逗号停顿
/// 2. 规范逗号后的空格
/// 3. 在 "and" 连接的两个词之间插入逗号
/// 4. 合并重复逗号
/// 5. 折叠空白并去除首尾空白
pub fn normalize_text(text: &str) -> String {
    let mut text = text.to_string();

    for (pattern, replacement) in PAUSE_RULES.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }

    text = COMMA_SPACING.replace_all(&text, ", ").into_owned();
    text = AND_CLAUSE.replace_all(&text, "${1}, and ${2}").into_owned();
    // 非重叠替换可能留下 ", , ," 的残余，直到稳定
    while DUPLICATE_COMMAS.is_match(&text) {
        text = DUPLICATE_COMMAS.replace_all(&text, ",").into_owned();
    }
    text = WHITESPACE.replace_all(&text, " ").into_owned();

    text.trim().to_string()
}
