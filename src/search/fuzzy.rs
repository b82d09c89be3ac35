//! Fuzzy matching / 模糊匹配
//!
//! Two unrelated modes share this module:
//! - catalog mode: binary order-preserving subsequence match (a token
//!   either matches a name or it does not, no partial credit);
//! - OCR mode: continuous [0,1] similarity blending bigram overlap, edit
//!   distance and positional agreement, tuned by OCR confidence.

use std::collections::HashSet;

/// Order-preserving subsequence match. Token characters must appear in
/// the candidate in the same relative order; reordering never matches.
/// A contiguous substring hit short-circuits. / 保序子序列匹配
pub fn subsequence_match(token: &str, name: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    if name.contains(token) {
        return true;
    }
    let mut pending = token.chars().peekable();
    for c in name.chars() {
        if pending.peek() == Some(&c) {
            pending.next();
        }
    }
    pending.peek().is_none()
}

/// Levenshtein edit distance over Unicode codepoints. / 编辑距离
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // 滚动单行，避免整个矩阵
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, &ca) in a.iter().enumerate() {
        let mut prev = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            let next = (row[j + 1] + 1).min(row[j] + 1).min(prev + cost);
            prev = row[j + 1];
            row[j + 1] = next;
        }
    }
    row[b.len()]
}

fn bigram_set(text: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Continuous OCR similarity in [0,1]:
/// 0.4 × bigram overlap + 0.4 × edit-distance score + 0.2 × positional
/// agreement. Exact equality short-circuits to 1.0. / OCR 相似度打分
pub fn ocr_similarity(query: &str, name: &str) -> f64 {
    if query.is_empty() || name.is_empty() {
        return 0.0;
    }
    if query == name {
        return 1.0;
    }

    let q_chars: Vec<char> = query.chars().collect();
    let n_chars: Vec<char> = name.chars().collect();
    let max_len = q_chars.len().max(n_chars.len());
    let min_len = q_chars.len().min(n_chars.len());

    let q_bigrams = bigram_set(query);
    let n_bigrams = bigram_set(name);
    let overlap = if q_bigrams.is_empty() && n_bigrams.is_empty() {
        0.0
    } else {
        let shared = q_bigrams.intersection(&n_bigrams).count();
        shared as f64 / q_bigrams.len().max(n_bigrams.len()) as f64
    };

    let edit = 1.0 - levenshtein(query, name) as f64 / max_len as f64;

    let same_pos = (0..min_len).filter(|&i| q_chars[i] == n_chars[i]).count();
    let positional = same_pos as f64 / max_len as f64;

    (0.4 * overlap + 0.4 * edit + 0.2 * positional).clamp(0.0, 1.0)
}

/// Candidate-set width and acceptance threshold for one OCR search,
/// relaxed when the OCR engine reports low confidence. / 按置信度放宽参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcrTuning {
    pub candidate_limit: usize,
    pub accept_threshold: f64,
}

impl OcrTuning {
    pub const DEFAULT: OcrTuning = OcrTuning {
        candidate_limit: 50,
        accept_threshold: 0.5,
    };

    /// Low confidence widens the candidate pool and lowers the bar;
    /// scores ≥ 70 keep the defaults. / 低置信度放宽，高置信度用默认值
    pub fn for_confidence(confidence: Option<u8>) -> Self {
        match confidence {
            Some(c) if c < 50 => OcrTuning {
                candidate_limit: 100,
                accept_threshold: 0.3,
            },
            Some(c) if c < 70 => OcrTuning {
                candidate_limit: 75,
                accept_threshold: 0.4,
            },
            _ => OcrTuning::DEFAULT,
        }
    }
}

/// Near-matches get a small confidence-inverse bonus: low OCR confidence
/// usually means partial character corruption, so a candidate already
/// above 0.7 deserves extra trust. Capped at 1.0. / 近似命中的置信度加成
pub fn apply_confidence_bonus(score: f64, confidence: Option<u8>) -> f64 {
    match confidence {
        Some(c) if score > 0.7 => {
            let bonus = (100.0 - f64::from(c.min(100))) / 100.0 * 0.1;
            (score + bonus).min(1.0)
        }
        _ => score,
    }
}
