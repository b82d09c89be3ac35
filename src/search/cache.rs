//! Corpus snapshot cache / 整表快照缓存
//!
//! Owned by the orchestrator instance, never process-global, so separate
//! sessions and tests do not share hidden state. A snapshot is loaded at
//! most once per language; concurrent callers await the in-flight load
//! instead of duplicating it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cancel::CancelFlag;
use crate::error::{Error, Result};
use crate::provider::{CandidateProvider, ItemId, ItemRecord, Language};
use crate::search::ngram::NgramIndex;

/// Immutable corpus view for one language: the records, an id lookup
/// table and the bigram index built over normalized names.
/// / 单语言的不可变目录视图
pub struct CorpusSnapshot {
    pub items: Vec<ItemRecord>,
    pub by_id: HashMap<ItemId, usize>,
    pub ngrams: NgramIndex,
}

impl CorpusSnapshot {
    fn build(items: Vec<ItemRecord>, ngram_size: usize) -> Self {
        let by_id = items
            .iter()
            .enumerate()
            .map(|(idx, item)| (item.id, idx))
            .collect();
        let ngrams = NgramIndex::build(&items, ngram_size);
        Self { items, by_id, ngrams }
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemRecord> {
        self.by_id.get(&id).map(|&idx| &self.items[idx])
    }
}

pub struct CorpusCache {
    provider: Arc<dyn CandidateProvider>,
    ngram_size: usize,
    snapshots: parking_lot::RwLock<HashMap<Language, Arc<CorpusSnapshot>>>,
    // 单飞锁：同一时间只允许一次整表加载
    load_lock: tokio::sync::Mutex<()>,
}

impl CorpusCache {
    pub fn new(provider: Arc<dyn CandidateProvider>, ngram_size: usize) -> Self {
        Self {
            provider,
            ngram_size,
            snapshots: parking_lot::RwLock::new(HashMap::new()),
            load_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Cached snapshot for `language`, loading it on first use. Cancelled
    /// loads leave the cache untouched. / 获取或加载语言快照
    pub async fn snapshot(
        &self,
        language: Language,
        cancel: &CancelFlag,
    ) -> Result<Arc<CorpusSnapshot>> {
        if let Some(snapshot) = self.snapshots.read().get(&language) {
            return Ok(snapshot.clone());
        }

        cancel.check()?;
        let _guard = self.load_lock.lock().await;
        cancel.check()?;

        // another caller may have finished the load while we waited
        if let Some(snapshot) = self.snapshots.read().get(&language) {
            return Ok(snapshot.clone());
        }

        let items = self
            .provider
            .full_corpus_snapshot(language)
            .await
            .map_err(Error::Provider)?;
        cancel.check()?;

        let snapshot = Arc::new(CorpusSnapshot::build(items, self.ngram_size));
        tracing::info!(
            "语料快照已加载 / corpus snapshot loaded: {:?}, {} items, {} windows",
            language,
            snapshot.items.len(),
            snapshot.ngrams.len()
        );
        self.snapshots.write().insert(language, snapshot.clone());
        Ok(snapshot)
    }

    /// Drop one language's snapshot (e.g. after a catalog patch).
    /// / 失效单语言快照
    pub fn invalidate(&self, language: Language) {
        self.snapshots.write().remove(&language);
    }

    /// Drop everything. / 清空全部快照
    pub fn reset(&self) {
        self.snapshots.write().clear();
    }

    /// Number of cached language snapshots. / 已缓存的语言数
    pub fn cached_languages(&self) -> usize {
        self.snapshots.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        corpus_calls: AtomicUsize,
    }

    #[async_trait]
    impl CandidateProvider for CountingProvider {
        async fn exact_search(
            &self,
            _query: &str,
            _language: Language,
            _fuzzy: bool,
        ) -> anyhow::Result<HashMap<ItemId, String>> {
            Ok(HashMap::new())
        }

        async fn batch_lookup_by_ids(
            &self,
            _ids: &[ItemId],
            _field: crate::provider::ItemField,
        ) -> anyhow::Result<HashMap<ItemId, crate::provider::FieldValue>> {
            Ok(HashMap::new())
        }

        async fn full_corpus_snapshot(
            &self,
            language: Language,
        ) -> anyhow::Result<Vec<ItemRecord>> {
            self.corpus_calls.fetch_add(1, Ordering::SeqCst);
            // yield so a concurrent caller can reach the load lock
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            Ok(vec![ItemRecord {
                id: 1,
                name: "遠古地圖".to_string(),
                language,
                tradable: true,
                item_level: None,
                patch: None,
            }])
        }

        async fn alternate_catalog_search(
            &self,
            _query: &str,
        ) -> anyhow::Result<HashMap<ItemId, String>> {
            Ok(HashMap::new())
        }
    }

    #[tokio::test]
    async fn test_single_flight_load() {
        let provider = Arc::new(CountingProvider {
            corpus_calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(CorpusCache::new(provider.clone(), 2));
        let cancel = CancelFlag::new();

        let (a, b) = tokio::join!(
            cache.snapshot(Language::ChineseTraditional, &cancel),
            cache.snapshot(Language::ChineseTraditional, &cancel),
        );
        assert_eq!(a.unwrap().items.len(), 1);
        assert_eq!(b.unwrap().items.len(), 1);
        assert_eq!(provider.corpus_calls.load(Ordering::SeqCst), 1);

        // cached afterwards, still one provider call
        let again = cache.snapshot(Language::ChineseTraditional, &cancel).await;
        assert!(again.is_ok());
        assert_eq!(provider.corpus_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let provider = Arc::new(CountingProvider {
            corpus_calls: AtomicUsize::new(0),
        });
        let cache = CorpusCache::new(provider.clone(), 2);
        let cancel = CancelFlag::new();

        cache
            .snapshot(Language::ChineseTraditional, &cancel)
            .await
            .unwrap();
        cache.invalidate(Language::ChineseTraditional);
        cache
            .snapshot(Language::ChineseTraditional, &cancel)
            .await
            .unwrap();
        assert_eq!(provider.corpus_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_load_leaves_cache_empty() {
        let provider = Arc::new(CountingProvider {
            corpus_calls: AtomicUsize::new(0),
        });
        let cache = CorpusCache::new(provider.clone(), 2);
        let cancel = CancelFlag::new();
        cancel.cancel();

        let got = cache.snapshot(Language::ChineseTraditional, &cancel).await;
        assert!(matches!(got, Err(Error::Cancelled)));
        assert_eq!(cache.cached_languages(), 0);
        assert_eq!(provider.corpus_calls.load(Ordering::SeqCst), 0);
    }
}
