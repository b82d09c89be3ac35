//! Name normalization and script detection / 名称标准化与文字检测
//!
//! Tokenization is deliberately dumb: whitespace split only. A query with
//! no whitespace is a single token searched as a contiguous substring;
//! word segmentation would change the matching contract.

pub mod script;

pub use script::{convert, Direction};

/// Dominant script of a piece of text. / 文本的主要文字类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Traditional,
    Simplified,
    /// CJK present but no table hit, or an even tie. / 无法判定
    Neutral,
}

#[derive(Debug, Clone, Copy)]
pub struct ScriptProfile {
    pub contains_cjk: bool,
    pub script: Script,
}

/// Trim and collapse runs of whitespace to single spaces. Idempotent.
/// / 去除首尾空白并压缩连续空白为单个空格
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace tokenization. A string without whitespace is one untouched
/// token; with whitespace, every word must match (AND semantics downstream).
/// / 按空白分词；无空白则整体作为单个词
pub fn tokenize(text: &str) -> Vec<String> {
    if text.chars().any(char::is_whitespace) {
        text.split_whitespace().map(str::to_string).collect()
    } else if text.is_empty() {
        Vec::new()
    } else {
        vec![text.to_string()]
    }
}

/// Check if text contains CJK characters (Chinese, Japanese, Korean).
/// / 检测文本是否包含CJK字符
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{4e00}'..='\u{9fff}' |  // CJK Unified Ideographs
            '\u{3400}'..='\u{4dbf}' |  // CJK Extension A
            '\u{3040}'..='\u{309f}' |  // Hiragana
            '\u{30a0}'..='\u{30ff}' |  // Katakana
            '\u{ac00}'..='\u{d7af}'    // Hangul Syllables
        )
    })
}

/// Classify script by counting hits in the two conversion tables. Pure
/// lookup, no statistics. / 通过映射表命中次数判定繁简
pub fn detect_script(text: &str) -> ScriptProfile {
    let mut traditional = 0usize;
    let mut simplified = 0usize;
    for c in text.chars() {
        if script::is_traditional_char(c) {
            traditional += 1;
        } else if script::is_simplified_char(c) {
            simplified += 1;
        }
    }
    let script = if traditional > simplified {
        Script::Traditional
    } else if simplified > traditional {
        Script::Simplified
    } else {
        Script::Neutral
    };
    ScriptProfile {
        contains_cjk: contains_cjk(text),
        script,
    }
}
