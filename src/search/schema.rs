//! Search request/response records / 搜索请求与响应结构

use serde::Serialize;

use crate::provider::ItemId;
use crate::text::{normalize, tokenize};

/// Ephemeral, built once per call. / 每次调用构建一次
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub raw: String,
    pub normalized: String,
    pub tokens: Vec<String>,
    /// Multi-word queries are eligible for the fuzzy stage; single tokens
    /// stay strictly substring. / 多词查询才进入模糊阶段
    pub fuzzy: bool,
}

impl SearchQuery {
    pub fn parse(raw: &str) -> Self {
        let normalized = normalize(raw);
        let tokens = tokenize(&normalized);
        let fuzzy = tokens.len() > 1;
        Self {
            raw: raw.to_string(),
            normalized,
            tokens,
            fuzzy,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Longest token (first wins on ties), used as the provider-side
    /// substring filter for multi-word queries. / 最长词元作为窄路径过滤条件
    pub fn longest_token(&self) -> &str {
        let mut best: Option<&str> = None;
        for token in &self.tokens {
            if best.map_or(true, |b| token.chars().count() > b.chars().count()) {
                best = Some(token);
            }
        }
        best.unwrap_or(&self.normalized)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: ItemId,
    /// Primary-language display name, resolved even for cross-language
    /// and alternate-catalog hits. / 主语言显示名称
    pub name: String,
    pub tradable: bool,
    pub item_level: Option<u32>,
    /// Populated in OCR mode only. / 仅 OCR 模式填充
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub used_script_conversion: bool,
    pub converted_text: Option<String>,
    pub used_alternate_catalog: bool,
}

impl SearchResponse {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Catalog ranking: tradable first, then item level descending where
/// known (unknown levels sort after known ones), then ascending id.
/// One direction for the id tie-break everywhere. / 目录结果排序
pub(crate) fn rank_catalog(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.tradable
            .cmp(&a.tradable)
            .then_with(|| match (a.item_level, b.item_level) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then(a.id.cmp(&b.id))
    });
}

/// OCR ranking: similarity score descending, then ascending id.
/// / OCR 结果按相似度排序
pub(crate) fn rank_ocr(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        let sa = a.score.unwrap_or(0.0);
        let sb = b.score.unwrap_or(0.0);
        sb.partial_cmp(&sa)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: ItemId, tradable: bool, level: Option<u32>) -> SearchResult {
        SearchResult {
            id,
            name: String::new(),
            tradable,
            item_level: level,
            score: None,
        }
    }

    #[test]
    fn test_parse_single_token() {
        let q = SearchQuery::parse("  遠古地圖 ");
        assert_eq!(q.normalized, "遠古地圖");
        assert_eq!(q.tokens, vec!["遠古地圖"]);
        assert!(!q.fuzzy);
    }

    #[test]
    fn test_parse_multi_token() {
        let q = SearchQuery::parse("遠古  地圖");
        assert_eq!(q.tokens, vec!["遠古", "地圖"]);
        assert!(q.fuzzy);
        assert_eq!(q.longest_token(), "遠古");
    }

    #[test]
    fn test_rank_catalog() {
        let mut rs = vec![
            result(5, false, Some(90)),
            result(4, true, None),
            result(3, true, Some(50)),
            result(2, true, Some(80)),
            result(1, true, Some(80)),
        ];
        rank_catalog(&mut rs);
        let ids: Vec<ItemId> = rs.iter().map(|r| r.id).collect();
        // tradable first, level desc, id asc inside equal levels,
        // unknown level after known, untradable last
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_rank_ocr() {
        let mut rs = vec![
            SearchResult { score: Some(0.6), ..result(9, true, None) },
            SearchResult { score: Some(1.0), ..result(7, true, None) },
            SearchResult { score: Some(0.6), ..result(2, true, None) },
        ];
        rank_ocr(&mut rs);
        let ids: Vec<ItemId> = rs.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![7, 2, 9]);
    }
}
