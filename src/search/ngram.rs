//! Bigram inverted index over catalog names / 目录名称的二元倒排索引
//!
//! Cheap pre-filter for OCR similarity search: the expensive per-candidate
//! score only runs over items sharing at least one window with the query,
//! bounding the scan to O(candidates) instead of O(corpus).

use std::collections::{HashMap, HashSet};

use crate::provider::{ItemId, ItemRecord};
use crate::text::normalize;

pub const DEFAULT_NGRAM_SIZE: usize = 2;

/// Immutable after `build`; wrap in `Arc` and share across concurrent
/// queries. / 构建后不可变，可跨并发查询共享
#[derive(Debug, Clone)]
pub struct NgramIndex {
    n: usize,
    grams: HashMap<String, Vec<ItemId>>,
}

/// Unicode-codepoint windows of length `n`. Byte windows would split
/// multi-byte CJK characters, so everything goes through `char`.
/// Text shorter than `n` yields its whole self as the single window,
/// otherwise one-character names would be unreachable. / 按码点切窗口
fn windows(text: &str, n: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    if chars.len() < n {
        return vec![chars.iter().collect()];
    }
    (0..=chars.len() - n)
        .map(|i| chars[i..i + n].iter().collect::<String>())
        .filter(|w| !w.trim().is_empty())
        .collect()
}

impl NgramIndex {
    pub fn build(corpus: &[ItemRecord], n: usize) -> Self {
        let mut grams: HashMap<String, Vec<ItemId>> = HashMap::new();
        for item in corpus {
            let name = normalize(&item.name);
            // 每个道具每个窗口只登记一次
            let unique: HashSet<String> = windows(&name, n).into_iter().collect();
            for w in unique {
                grams.entry(w).or_default().push(item.id);
            }
        }
        Self { n, grams }
    }

    /// Item ids sharing at least one window with `text`, ordered by
    /// shared-window count descending, then id ascending. / 按重叠窗口数排序
    pub fn query(&self, text: &str) -> Vec<(ItemId, usize)> {
        let unique: HashSet<String> = windows(&normalize(text), self.n).into_iter().collect();
        let mut overlap: HashMap<ItemId, usize> = HashMap::new();
        for w in &unique {
            if let Some(ids) = self.grams.get(w) {
                for &id in ids {
                    *overlap.entry(id).or_default() += 1;
                }
            }
        }
        let mut out: Vec<(ItemId, usize)> = overlap.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        out
    }

    /// Number of distinct windows in the index. / 索引中不同窗口的数量
    pub fn len(&self) -> usize {
        self.grams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Language;

    fn item(id: ItemId, name: &str) -> ItemRecord {
        ItemRecord {
            id,
            name: name.to_string(),
            language: Language::ChineseTraditional,
            tradable: true,
            item_level: None,
            patch: None,
        }
    }

    #[test]
    fn test_windows_codepoint_aware() {
        assert_eq!(windows("遠古地圖", 2), vec!["遠古", "古地", "地圖"]);
        assert_eq!(windows("火", 2), vec!["火"]);
        assert!(windows("", 2).is_empty());
    }

    #[test]
    fn test_query_overlap_ordering() {
        let corpus = vec![
            item(1, "遠古地圖"),
            item(2, "鞣革地圖"),
            item(3, "鋼鐵錠"),
        ];
        let index = NgramIndex::build(&corpus, 2);

        let hits = index.query("地圖");
        assert_eq!(hits.len(), 2);
        // both share the single window 地圖; id ascending breaks the tie
        assert_eq!(hits[0].0, 1);
        assert_eq!(hits[1].0, 2);

        let hits = index.query("遠古地圖");
        assert_eq!(hits[0], (1, 3));
    }

    #[test]
    fn test_single_char_name_reachable() {
        let corpus = vec![item(7, "火")];
        let index = NgramIndex::build(&corpus, 2);
        let hits = index.query("火");
        assert_eq!(hits, vec![(7, 1)]);
    }

    #[test]
    fn test_no_shared_windows() {
        let corpus = vec![item(1, "遠古地圖")];
        let index = NgramIndex::build(&corpus, 2);
        assert!(index.query("鋼鐵").is_empty());
    }
}
