//! Cascade stages / 级联搜索阶段
//!
//! The pipeline is an ordered list of stage objects; a stage runs only
//! when every stage before it produced zero hits. Stage hits carry the
//! id plus a display name; tradability/level enrichment and ranking
//! happen once, in the orchestrator, after the winning stage.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::cancel::CancelFlag;
use crate::error::{Error, Result};
use crate::provider::{CandidateProvider, ItemField, ItemId, Language};
use crate::search::cache::CorpusCache;
use crate::search::fuzzy::subsequence_match;
use crate::search::schema::SearchQuery;
use crate::text::{self, Direction, Script};

/// One candidate surfaced by a stage. / 单个候选
#[derive(Debug, Clone)]
pub(crate) struct Hit {
    pub id: ItemId,
    pub name: String,
}

/// Mutable per-call state threaded through the cascade so the final
/// response can disclose conversions. / 级联过程中的可变状态
pub(crate) struct StageContext<'a> {
    pub query: &'a SearchQuery,
    pub cancel: &'a CancelFlag,
    pub used_script_conversion: bool,
    pub converted_text: Option<String>,
    pub used_alternate_catalog: bool,
}

#[async_trait]
pub(crate) trait Stage: Send + Sync {
    fn name(&self) -> &'static str;
    async fn attempt(&self, cx: &mut StageContext<'_>) -> Result<Vec<Hit>>;
}

/// AND semantics: a name qualifies only when every token appears in it
/// as a contiguous substring. / 所有词元都必须以子串形式出现
pub(crate) fn contains_all_tokens(name: &str, tokens: &[String]) -> bool {
    tokens.iter().all(|t| name.contains(t.as_str()))
}

/// Narrow-path substring lookup with client-side AND filtering. The
/// provider filters on the longest token; we re-check every token so the
/// contract holds even against a sloppy provider. / 窄路径查询
async fn exact_lookup(
    provider: &Arc<dyn CandidateProvider>,
    query: &SearchQuery,
    language: Language,
    cancel: &CancelFlag,
) -> Result<Vec<Hit>> {
    cancel.check()?;
    let found = provider
        .exact_search(query.longest_token(), language, query.fuzzy)
        .await
        .map_err(Error::Provider)?;
    cancel.check()?;

    let mut hits: Vec<Hit> = found
        .into_iter()
        .filter(|(_, name)| contains_all_tokens(name, &query.tokens))
        .map(|(id, name)| Hit { id, name })
        .collect();
    hits.sort_by_key(|h| h.id);
    Ok(hits)
}

/// Corpus scan with the order-preserving subsequence matcher, one pass
/// per item, AND across tokens. The cheap paths cannot express this, so
/// it is the one place the full snapshot is pulled. / 整表模糊扫描
async fn fuzzy_lookup(
    cache: &CorpusCache,
    query: &SearchQuery,
    language: Language,
    cancel: &CancelFlag,
) -> Result<Vec<Hit>> {
    let snapshot = cache.snapshot(language, cancel).await?;
    cancel.check()?;

    let hits = snapshot
        .items
        .iter()
        .filter(|item| {
            let name = text::normalize(&item.name);
            query.tokens.iter().all(|t| subsequence_match(t, &name))
        })
        .map(|item| Hit {
            id: item.id,
            name: item.name.clone(),
        })
        .collect();
    Ok(hits)
}

/// Stages 1–2 semantics against one language: exact first, then (for
/// multi-word queries only) the fuzzy scan. / 单语言内的精确+模糊组合
async fn exact_then_fuzzy(
    provider: &Arc<dyn CandidateProvider>,
    cache: &CorpusCache,
    query: &SearchQuery,
    language: Language,
    cancel: &CancelFlag,
) -> Result<Vec<Hit>> {
    let hits = exact_lookup(provider, query, language, cancel).await?;
    if !hits.is_empty() || !query.fuzzy {
        return Ok(hits);
    }
    fuzzy_lookup(cache, query, language, cancel).await
}

/// Resolve primary-language display names for hits found elsewhere;
/// falls back to the found name when the lookup has no entry.
/// / 将他语言命中解析回主语言名称
async fn resolve_primary_names(
    provider: &Arc<dyn CandidateProvider>,
    hits: Vec<Hit>,
    primary: Language,
    cancel: &CancelFlag,
) -> Result<Vec<Hit>> {
    if hits.is_empty() {
        return Ok(hits);
    }
    let ids: Vec<ItemId> = hits.iter().map(|h| h.id).collect();
    cancel.check()?;
    let names: HashMap<ItemId, _> = provider
        .batch_lookup_by_ids(&ids, ItemField::Name(primary))
        .await
        .map_err(Error::Provider)?;
    cancel.check()?;

    Ok(hits
        .into_iter()
        .map(|h| {
            let name = names
                .get(&h.id)
                .and_then(|v| v.as_text())
                .map(str::to_string)
                .unwrap_or(h.name);
            Hit { id: h.id, name }
        })
        .collect())
}

/// Stage 1: exact substring match in the primary language. / 阶段一
pub(crate) struct ExactPrimary {
    pub provider: Arc<dyn CandidateProvider>,
    pub language: Language,
}

#[async_trait]
impl Stage for ExactPrimary {
    fn name(&self) -> &'static str {
        "exact_primary"
    }

    async fn attempt(&self, cx: &mut StageContext<'_>) -> Result<Vec<Hit>> {
        exact_lookup(&self.provider, cx.query, self.language, cx.cancel).await
    }
}

/// Stage 2: subsequence scan, multi-word queries only. / 阶段二
pub(crate) struct FuzzyPrimary {
    pub cache: Arc<CorpusCache>,
    pub language: Language,
}

#[async_trait]
impl Stage for FuzzyPrimary {
    fn name(&self) -> &'static str {
        "fuzzy_primary"
    }

    async fn attempt(&self, cx: &mut StageContext<'_>) -> Result<Vec<Hit>> {
        if !cx.query.fuzzy {
            return Ok(Vec::new());
        }
        fuzzy_lookup(&self.cache, cx.query, self.language, cx.cancel).await
    }
}

/// Stage 3: fixed-priority sweep of the other catalog languages; the
/// first language producing hits wins and its ids are resolved back to
/// primary-language names. / 阶段三：跨语言重试
pub(crate) struct ExactOtherLanguages {
    pub provider: Arc<dyn CandidateProvider>,
    pub cache: Arc<CorpusCache>,
    pub primary: Language,
    pub priority: Vec<Language>,
}

#[async_trait]
impl Stage for ExactOtherLanguages {
    fn name(&self) -> &'static str {
        "exact_other_languages"
    }

    async fn attempt(&self, cx: &mut StageContext<'_>) -> Result<Vec<Hit>> {
        for &language in &self.priority {
            cx.cancel.check()?;
            let hits =
                exact_then_fuzzy(&self.provider, &self.cache, cx.query, language, cx.cancel)
                    .await?;
            if !hits.is_empty() {
                tracing::debug!("跨语言命中 / cross-language hit: {:?}", language);
                return resolve_primary_names(&self.provider, hits, self.primary, cx.cancel)
                    .await;
            }
        }
        Ok(Vec::new())
    }
}

/// Stage 4: retry stages 1–2 with the query converted to the opposite
/// script, when that produces different CJK text. / 阶段四：繁简转换重试
pub(crate) struct ScriptConvertedRetry {
    pub provider: Arc<dyn CandidateProvider>,
    pub cache: Arc<CorpusCache>,
    pub language: Language,
}

#[async_trait]
impl Stage for ScriptConvertedRetry {
    fn name(&self) -> &'static str {
        "script_converted_retry"
    }

    async fn attempt(&self, cx: &mut StageContext<'_>) -> Result<Vec<Hit>> {
        let profile = text::detect_script(&cx.query.normalized);
        let direction = match profile.script {
            Script::Traditional => Direction::ToSimplified,
            Script::Simplified | Script::Neutral => Direction::ToTraditional,
        };
        let converted = text::convert(&cx.query.normalized, direction);
        if converted == cx.query.normalized || !text::contains_cjk(&converted) {
            return Ok(Vec::new());
        }

        let retry = SearchQuery::parse(&converted);
        let hits =
            exact_then_fuzzy(&self.provider, &self.cache, &retry, self.language, cx.cancel)
                .await?;
        if !hits.is_empty() {
            cx.used_script_conversion = true;
            cx.converted_text = Some(converted);
        }
        Ok(hits)
    }
}

/// Stage 5: substring-only lookup in the secondary simplified-script
/// catalog, never fuzzy; recovered ids are resolved back to primary
/// names. / 阶段五：简体备用目录
pub(crate) struct AlternateCatalogLookup {
    pub provider: Arc<dyn CandidateProvider>,
    pub primary: Language,
}

#[async_trait]
impl Stage for AlternateCatalogLookup {
    fn name(&self) -> &'static str {
        "alternate_catalog"
    }

    async fn attempt(&self, cx: &mut StageContext<'_>) -> Result<Vec<Hit>> {
        let simplified = text::convert(&cx.query.normalized, Direction::ToSimplified);
        let tokens = text::tokenize(&simplified);

        cx.cancel.check()?;
        let found = self
            .provider
            .alternate_catalog_search(&simplified)
            .await
            .map_err(Error::Provider)?;
        cx.cancel.check()?;

        let mut hits: Vec<Hit> = found
            .into_iter()
            .filter(|(_, name)| contains_all_tokens(name, &tokens))
            .map(|(id, name)| Hit { id, name })
            .collect();
        hits.sort_by_key(|h| h.id);

        let hits =
            resolve_primary_names(&self.provider, hits, self.primary, cx.cancel).await?;
        if !hits.is_empty() {
            cx.used_alternate_catalog = true;
        }
        Ok(hits)
    }
}
