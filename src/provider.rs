//! External data-source contracts / 外部数据源契约
//!
//! Three-tier cost discipline for the catalog: narrow substring lookup
//! first, id-batch enrichment second, full-corpus snapshot only as an
//! explicit opt-in (true fuzzy scanning and n-gram index builds). The
//! core never sees raw catalog rows; providers map them into the typed
//! records here at the ingestion boundary.
//!
//! Retries/backoff belong to the provider layer, never to the core.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable catalog key. Invariant: positive and unique. / 道具目录主键
pub type ItemId = u32;

/// Catalog languages. / 目录语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    ChineseTraditional,
    Japanese,
    English,
    German,
    French,
}

/// Fixed fallback order for the cross-language retry stage.
/// / 跨语言重试的固定优先级
pub const OTHER_LANGUAGE_PRIORITY: [Language; 4] = [
    Language::Japanese,
    Language::English,
    Language::German,
    Language::French,
];

/// One catalog row, already mapped by the provider. / 一条目录记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub name: String,
    pub language: Language,
    pub tradable: bool,
    pub item_level: Option<u32>,
    pub patch: Option<String>,
}

/// Field selector for batch id lookups. / 批量查询的字段选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Name(Language),
    Tradable,
    ItemLevel,
    Patch,
}

/// Typed value for one looked-up field. / 字段值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Number(u32),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<u32> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// One crafting recipe. `yield_amount` is how many result items a single
/// craft produces. / 一条制作配方
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: ItemId,
    pub yield_amount: u32,
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: ItemId,
    pub amount: u32,
}

/// Catalog lookups. Every method is an async I/O boundary; failures are
/// surfaced as-is and the search cascade decides how to recover.
/// / 目录数据源
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    /// Narrow substring lookup, filtered provider-side where possible.
    /// Never materializes the whole catalog. / 窄路径子串查询
    async fn exact_search(
        &self,
        query: &str,
        language: Language,
        fuzzy: bool,
    ) -> anyhow::Result<HashMap<ItemId, String>>;

    /// Batch enrichment by id. / 按 id 批量补全字段
    async fn batch_lookup_by_ids(
        &self,
        ids: &[ItemId],
        field: ItemField,
    ) -> anyhow::Result<HashMap<ItemId, FieldValue>>;

    /// Full catalog for one language. Expensive, explicit opt-in only.
    /// / 整表快照，仅显式按需调用
    async fn full_corpus_snapshot(&self, language: Language) -> anyhow::Result<Vec<ItemRecord>>;

    /// Substring lookup in the secondary simplified-script catalog,
    /// used to recover ids when the primary catalog found nothing.
    /// / 简体备用目录查询
    async fn alternate_catalog_search(&self, query: &str)
        -> anyhow::Result<HashMap<ItemId, String>>;
}

/// Recipe lookups keyed by result-item id. / 按成品 id 查询配方
#[async_trait]
pub trait RecipeProvider: Send + Sync {
    async fn recipes_for_result(&self, id: ItemId) -> anyhow::Result<Vec<Recipe>>;
}
