//! Search module - cascading multilingual item-name resolution / 搜索模块
//!
//! Architecture principles / 架构原则：
//! - leaf modules expose primitives only (matching, indexing, caching);
//!   the orchestrator owns the control flow
//! - stages are data: an ordered list iterated until one yields hits
//! - every provider call is an await point with cancellation checks on
//!   both sides; cancelled pipelines never return partial lists

pub mod cache;
pub mod fuzzy;
pub mod ngram;
pub mod schema;
mod stages;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cancel::CancelFlag;
use crate::error::{Error, Result};
use crate::provider::{
    CandidateProvider, ItemField, ItemId, Language, OTHER_LANGUAGE_PRIORITY,
};
use crate::text;

use cache::CorpusCache;
use fuzzy::{apply_confidence_bonus, ocr_similarity, OcrTuning};
use schema::{rank_catalog, rank_ocr, SearchQuery};
use stages::{
    AlternateCatalogLookup, ExactOtherLanguages, ExactPrimary, FuzzyPrimary,
    ScriptConvertedRetry, Stage, StageContext,
};

pub use cache::CorpusSnapshot;
pub use ngram::{NgramIndex, DEFAULT_NGRAM_SIZE};
pub use schema::{SearchQuery as Query, SearchResponse, SearchResult};

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub primary_language: Language,
    /// Fixed priority for the cross-language retry stage. / 跨语言优先级
    pub other_languages: Vec<Language>,
    pub ngram_size: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            primary_language: Language::ChineseTraditional,
            other_languages: OTHER_LANGUAGE_PRIORITY.to_vec(),
            ngram_size: DEFAULT_NGRAM_SIZE,
        }
    }
}

/// Owns the stage list, the corpus cache and the request sequence. One
/// instance per session; nothing here is process-global. / 搜索调度器
pub struct SearchOrchestrator {
    provider: Arc<dyn CandidateProvider>,
    cache: Arc<CorpusCache>,
    stages: Vec<Box<dyn Stage>>,
    options: SearchOptions,
    // 单调递增的请求序号，旧请求的迟到结果被丢弃
    seq: AtomicU64,
}

impl SearchOrchestrator {
    pub fn new(provider: Arc<dyn CandidateProvider>) -> Self {
        Self::with_options(provider, SearchOptions::default())
    }

    pub fn with_options(provider: Arc<dyn CandidateProvider>, options: SearchOptions) -> Self {
        let cache = Arc::new(CorpusCache::new(provider.clone(), options.ngram_size));
        let primary = options.primary_language;
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(ExactPrimary {
                provider: provider.clone(),
                language: primary,
            }),
            Box::new(FuzzyPrimary {
                cache: cache.clone(),
                language: primary,
            }),
            Box::new(ExactOtherLanguages {
                provider: provider.clone(),
                cache: cache.clone(),
                primary,
                priority: options.other_languages.clone(),
            }),
            Box::new(ScriptConvertedRetry {
                provider: provider.clone(),
                cache: cache.clone(),
                language: primary,
            }),
            Box::new(AlternateCatalogLookup {
                provider: provider.clone(),
                primary,
            }),
        ];
        Self {
            provider,
            cache,
            stages,
            options,
            seq: AtomicU64::new(0),
        }
    }

    /// Snapshot cache, exposed for lifecycle control (invalidate on
    /// catalog patches, reset between sessions). / 快照缓存
    pub fn cache(&self) -> &CorpusCache {
        &self.cache
    }

    /// Prefetch the corpus for a language so the first fuzzy/OCR query
    /// does not pay the load. / 预热语料
    pub async fn warm_up(&self, language: Language) -> Result<()> {
        self.cache.snapshot(language, &CancelFlag::new()).await?;
        Ok(())
    }

    fn next_ticket(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last-request-wins: a result computed for an old ticket is
    /// discarded instead of overwriting fresher state. / 旧请求丢弃
    fn ensure_current(&self, ticket: u64) -> Result<()> {
        if self.seq.load(Ordering::SeqCst) != ticket {
            Err(Error::Superseded)
        } else {
            Ok(())
        }
    }

    /// Cascading name search. Stages run in order; each is entered only
    /// when everything before it produced zero hits. A non-cancel stage
    /// failure is logged and the cascade advances. / 级联搜索
    pub async fn search(&self, raw: &str, cancel: &CancelFlag) -> Result<SearchResponse> {
        let ticket = self.next_ticket();
        cancel.check()?;

        let query = SearchQuery::parse(raw);
        if query.is_empty() {
            return Ok(SearchResponse::empty());
        }
        if !text::contains_cjk(&query.normalized) {
            return Err(Error::NotChineseInput);
        }

        let mut cx = StageContext {
            query: &query,
            cancel,
            used_script_conversion: false,
            converted_text: None,
            used_alternate_catalog: false,
        };

        let mut hits = Vec::new();
        for stage in &self.stages {
            cancel.check()?;
            match stage.attempt(&mut cx).await {
                Ok(found) if !found.is_empty() => {
                    tracing::debug!(
                        "阶段 {} 命中 {} 条 / stage hit",
                        stage.name(),
                        found.len()
                    );
                    hits = found;
                    break;
                }
                Ok(_) => {}
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "搜索阶段 {} 失败，继续下一阶段 / stage failed, advancing: {}",
                        stage.name(),
                        e
                    );
                }
            }
        }

        let mut results = self.enrich(hits, cancel).await?;
        rank_catalog(&mut results);
        self.ensure_current(ticket)?;

        Ok(SearchResponse {
            results,
            used_script_conversion: cx.used_script_conversion,
            converted_text: cx.converted_text,
            used_alternate_catalog: cx.used_alternate_catalog,
        })
    }

    /// OCR similarity search over the n-gram-filtered candidate set.
    /// Scores ride along in the results; confidence (0–100) from the OCR
    /// engine relaxes the candidate width and threshold. / OCR 相似搜索
    pub async fn search_ocr(
        &self,
        raw: &str,
        confidence: Option<u8>,
        cancel: &CancelFlag,
    ) -> Result<SearchResponse> {
        let ticket = self.next_ticket();
        cancel.check()?;

        let normalized = text::normalize(raw);
        if normalized.is_empty() {
            return Ok(SearchResponse::empty());
        }
        if !text::contains_cjk(&normalized) {
            return Err(Error::NotChineseInput);
        }

        let tuning = OcrTuning::for_confidence(confidence);
        let snapshot = self
            .cache
            .snapshot(self.options.primary_language, cancel)
            .await?;
        cancel.check()?;

        let candidates = snapshot.ngrams.query(&normalized);
        let mut results: Vec<SearchResult> = Vec::new();
        for (id, _overlap) in candidates.into_iter().take(tuning.candidate_limit) {
            let Some(item) = snapshot.get(id) else { continue };
            let base = ocr_similarity(&normalized, &text::normalize(&item.name));
            let score = apply_confidence_bonus(base, confidence);
            if score >= tuning.accept_threshold {
                results.push(SearchResult {
                    id,
                    name: item.name.clone(),
                    tradable: item.tradable,
                    item_level: item.item_level,
                    score: Some(score),
                });
            }
        }
        rank_ocr(&mut results);
        self.ensure_current(ticket)?;

        Ok(SearchResponse {
            results,
            ..SearchResponse::empty()
        })
    }

    /// Tradability/level enrichment for the winning stage's hits. An
    /// enrichment failure downgrades gracefully instead of discarding
    /// the hits. / 补全可交易性与等级
    async fn enrich(
        &self,
        hits: Vec<stages::Hit>,
        cancel: &CancelFlag,
    ) -> Result<Vec<SearchResult>> {
        if hits.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<ItemId> = hits.iter().map(|h| h.id).collect();

        cancel.check()?;
        let tradable = match self
            .provider
            .batch_lookup_by_ids(&ids, ItemField::Tradable)
            .await
        {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("可交易性查询失败 / tradable lookup failed: {}", e);
                Default::default()
            }
        };
        cancel.check()?;
        let levels = match self
            .provider
            .batch_lookup_by_ids(&ids, ItemField::ItemLevel)
            .await
        {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("等级查询失败 / item level lookup failed: {}", e);
                Default::default()
            }
        };
        cancel.check()?;

        Ok(hits
            .into_iter()
            .map(|h| SearchResult {
                id: h.id,
                tradable: tradable.get(&h.id).and_then(|v| v.as_flag()).unwrap_or(false),
                item_level: levels.get(&h.id).and_then(|v| v.as_number()),
                name: h.name,
                score: None,
            })
            .collect())
    }
}
