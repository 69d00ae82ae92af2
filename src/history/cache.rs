use std::collections::VecDeque;

use derive_more::IntoIterator;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::{
    error::{DiceError, Result},
    history::{
        record::{RecordView, RollRecord},
        store::{RecordStore, ReportOptions},
    },
};

pub const DEFAULT_MAX_KEYS: usize = 8;
pub const DEFAULT_RECORD_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    pub max_keys: usize,
    pub per_key_capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_keys: DEFAULT_MAX_KEYS,
            per_key_capacity: DEFAULT_RECORD_CAPACITY,
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_keys < 1 {
            return Err(DiceError::invalid_argument("history needs room for at least one key"));
        }
        if self.per_key_capacity < 1 {
            return Err(DiceError::invalid_argument(
                "history needs room for at least one record per key",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct HistoryCacheBuilder {
    config: HistoryConfig,
}

impl HistoryCacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_keys(mut self, max_keys: usize) -> Self {
        self.config.max_keys = max_keys;
        self
    }

    pub fn per_key_capacity(mut self, capacity: usize) -> Self {
        self.config.per_key_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<HistoryCache> {
        HistoryCache::from_config(&self.config)
    }
}

/// Per-key store reports, oldest key first. Serializes as a map in that order.
#[derive(Debug, Default, Clone, PartialEq, Eq, IntoIterator)]
pub struct HistoryReport {
    entries: Vec<(String, Vec<RecordView>)>,
}

impl HistoryReport {
    pub fn get(&self, key: &str) -> Option<&Vec<RecordView>> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, views)| views)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for HistoryReport {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

/// Several independently capped record stores addressed by a context key.
///
/// Keys are evicted in the order they were first inserted. Reading, writing or
/// re-activating a key does not move it in that order.
#[derive(Debug, Clone)]
pub struct HistoryCache {
    config: HistoryConfig,
    stores: FxHashMap<String, RecordStore>,
    insertion_order: VecDeque<String>,
    active_key: Option<String>,
}

impl HistoryCache {
    pub fn new(max_keys: usize, per_key_capacity: usize) -> Result<Self> {
        Self::from_config(&HistoryConfig {
            max_keys,
            per_key_capacity,
        })
    }

    pub fn from_config(config: &HistoryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: *config,
            stores: FxHashMap::default(),
            insertion_order: VecDeque::with_capacity(config.max_keys),
            active_key: None,
        })
    }

    pub fn builder() -> HistoryCacheBuilder {
        HistoryCacheBuilder::new()
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn set_active_key(&mut self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(DiceError::invalid_argument("history key must not be empty"));
        }
        if !self.stores.contains_key(key) {
            let store = RecordStore::new(self.config.per_key_capacity)?;
            while self.insertion_order.len() >= self.config.max_keys {
                self.evict_oldest_key();
            }
            if let Some(active) = &self.active_key
                && !self.stores.contains_key(active)
            {
                log::debug!("replacing evicted active key {active:?} with {key:?}");
            }
            log::debug!("creating history for key {key:?}");
            self.stores.insert(key.to_string(), store);
            self.insertion_order.push_back(key.to_string());
        }
        self.active_key = Some(key.to_string());
        Ok(())
    }

    fn evict_oldest_key(&mut self) {
        let Some(oldest) = self.insertion_order.pop_front() else {
            return;
        };
        self.stores.remove(&oldest);
        log::debug!("history key limit reached, evicted key {oldest:?}");
    }

    pub fn active_key(&self) -> Option<&str> {
        self.active_key.as_deref()
    }

    pub fn active_store(&self) -> Option<&RecordStore> {
        self.active_key.as_ref().and_then(|k| self.stores.get(k))
    }

    fn active_store_mut(&mut self) -> Result<&mut RecordStore> {
        let key = self
            .active_key
            .as_ref()
            .ok_or_else(|| DiceError::invalid_state("no active key"))?;
        self.stores
            .get_mut(key)
            .ok_or_else(|| DiceError::invalid_state(format!("active key {key:?} has no store")))
    }

    pub fn add(&mut self, record: RollRecord) -> Result<()> {
        self.active_store_mut()?.add(record)
    }

    pub fn get_all(&self, verbose: bool) -> Vec<RecordView> {
        match self.active_store() {
            Some(store) if verbose => store.full().into_iter().map(RecordView::Full).collect(),
            Some(store) => store.all().into_iter().map(RecordView::Stripped).collect(),
            None => Vec::new(),
        }
    }

    pub fn store(&self, key: &str) -> Option<&RecordStore> {
        self.stores.get(key)
    }

    pub fn clear_active(&mut self) {
        if let Ok(store) = self.active_store_mut() {
            store.clear();
        }
    }

    pub fn clear_all(&mut self) {
        self.stores.clear();
        self.insertion_order.clear();
        self.active_key = None;
    }

    pub fn report(&self, options: ReportOptions) -> Result<HistoryReport> {
        let mut entries = Vec::with_capacity(self.insertion_order.len());
        for key in &self.insertion_order {
            if let Some(store) = self.stores.get(key) {
                entries.push((key.clone(), store.report(options)?));
            }
        }
        Ok(HistoryReport { entries })
    }

    /// Keys in eviction order, oldest first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.insertion_order.iter().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.stores.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl Default for HistoryCache {
    fn default() -> Self {
        Self {
            config: HistoryConfig::default(),
            stores: FxHashMap::default(),
            insertion_order: VecDeque::new(),
            active_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn faces(views: &[RecordView]) -> Vec<u32> {
        views.iter().map(RecordView::face).collect()
    }

    #[test]
    fn test_zero_bounds() {
        assert_eq!(
            HistoryCache::new(0, 5).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            HistoryCache::new(5, 0).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_add_without_active_key() {
        let mut cache = HistoryCache::new(2, 2).unwrap();
        let err = cache.add(RollRecord::plain(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(cache.get_all(true).is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_eviction() -> anyhow::Result<()> {
        let mut cache = HistoryCache::new(2, 5)?;
        for key in ["K1", "K2", "K3"] {
            cache.set_active_key(key)?;
            cache.add(RollRecord::plain(1))?;
        }
        let report = cache.report(ReportOptions::default())?;
        let keys: Vec<&str> = report.keys().collect();
        assert_eq!(keys, vec!["K2", "K3"]);
        assert!(!report.contains_key("K1"));
        assert_eq!(cache.len(), 2);
        Ok(())
    }

    #[test]
    fn test_report_keeps_eviction_order() -> anyhow::Result<()> {
        let mut cache = HistoryCache::new(3, 5)?;
        for key in ["zeta", "mu", "alpha", "omega"] {
            cache.set_active_key(key)?;
            cache.add(RollRecord::plain(2))?;
        }
        let report = cache.report(ReportOptions::default())?;
        assert_eq!(report.keys().collect::<Vec<_>>(), vec!["mu", "alpha", "omega"]);

        let json = serde_json::to_string(&report)?;
        let mu = json.find("\"mu\"").unwrap();
        let alpha = json.find("\"alpha\"").unwrap();
        let omega = json.find("\"omega\"").unwrap();
        assert!(mu < alpha && alpha < omega, "{json}");
        Ok(())
    }

    #[test]
    fn test_reactivation_does_not_refresh_eviction_order() -> anyhow::Result<()> {
        let mut cache = HistoryCache::new(2, 5)?;
        cache.set_active_key("K1")?;
        cache.set_active_key("K2")?;
        // touching K1 again would save it under LRU, but eviction is by first insertion
        cache.set_active_key("K1")?;
        cache.add(RollRecord::plain(4))?;
        cache.set_active_key("K3")?;

        assert!(!cache.contains_key("K1"));
        assert!(cache.contains_key("K2"));
        assert!(cache.contains_key("K3"));
        assert_eq!(cache.keys().collect::<Vec<_>>(), vec!["K2", "K3"]);
        Ok(())
    }

    #[test]
    fn test_evicting_active_key_activates_new_key() -> anyhow::Result<()> {
        let mut cache = HistoryCache::new(1, 5)?;
        cache.set_active_key("K1")?;
        cache.add(RollRecord::plain(3))?;
        cache.set_active_key("K2")?;
        assert_eq!(cache.active_key(), Some("K2"));
        assert!(!cache.contains_key("K1"));
        assert!(cache.get_all(true).is_empty());

        cache.add(RollRecord::plain(5))?;
        assert_eq!(faces(&cache.get_all(false)), vec![5]);
        Ok(())
    }

    #[test]
    fn test_independence() -> anyhow::Result<()> {
        let mut cache = HistoryCache::new(3, 5)?;
        cache.set_active_key("a")?;
        cache.add(RollRecord::plain(1))?;
        cache.set_active_key("b")?;
        cache.add(RollRecord::plain(2))?;
        cache.set_active_key("a")?;
        cache.add(RollRecord::plain(3))?;
        cache.set_active_key("c")?;
        cache.set_active_key("b")?;
        cache.add(RollRecord::plain(4))?;

        let report = cache.report(ReportOptions::default())?;
        assert_eq!(faces(report.get("a").unwrap()), vec![1, 3]);
        assert_eq!(faces(report.get("b").unwrap()), vec![2, 4]);
        assert!(report.get("c").unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn test_per_key_capacity() -> anyhow::Result<()> {
        let mut cache = HistoryCache::builder()
            .max_keys(2)
            .per_key_capacity(2)
            .build()?;
        cache.set_active_key("session")?;
        for face in 1..=3 {
            cache.add(RollRecord::plain(face))?;
        }
        assert_eq!(faces(&cache.get_all(false)), vec![2, 3]);
        Ok(())
    }

    #[test]
    fn test_get_all_verbosity() -> anyhow::Result<()> {
        let mut cache = HistoryCache::new(2, 2)?;
        cache.set_active_key("k")?;
        cache.add(RollRecord::modified(2, 5))?;
        assert!(matches!(cache.get_all(true)[0], RecordView::Full(_)));
        assert!(matches!(cache.get_all(false)[0], RecordView::Stripped(_)));
        Ok(())
    }

    #[test]
    fn test_clear_active_and_clear_all() -> anyhow::Result<()> {
        let mut cache = HistoryCache::new(3, 5)?;
        cache.set_active_key("a")?;
        cache.add(RollRecord::plain(1))?;
        cache.set_active_key("b")?;
        cache.add(RollRecord::plain(2))?;

        cache.clear_active();
        assert!(cache.get_all(false).is_empty());
        assert!(cache.contains_key("b"));
        assert_eq!(cache.store("a").map(RecordStore::len), Some(1));

        cache.clear_all();
        assert!(cache.is_empty());
        assert_eq!(cache.active_key(), None);
        assert_eq!(
            cache.add(RollRecord::plain(1)).unwrap_err().kind(),
            ErrorKind::InvalidState
        );
        Ok(())
    }

    #[test]
    fn test_empty_key_does_not_mutate() -> anyhow::Result<()> {
        let mut cache = HistoryCache::new(1, 5)?;
        cache.set_active_key("only")?;
        assert!(cache.set_active_key("").is_err());
        assert_eq!(cache.active_key(), Some("only"));
        assert!(cache.contains_key("only"));
        Ok(())
    }

    #[test]
    fn test_report_is_independent_of_active_key() -> anyhow::Result<()> {
        let mut cache = HistoryCache::new(3, 5)?;
        cache.set_active_key("a")?;
        cache.add(RollRecord::plain(6))?;
        cache.set_active_key("b")?;
        let first = cache.report(ReportOptions::verbose())?;
        cache.set_active_key("a")?;
        let second = cache.report(ReportOptions::verbose())?;
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        Ok(())
    }

    #[test]
    fn test_config_from_json() -> anyhow::Result<()> {
        let config: HistoryConfig = serde_json::from_str(r#"{"maxKeys": 3}"#)?;
        assert_eq!(config.max_keys, 3);
        assert_eq!(config.per_key_capacity, DEFAULT_RECORD_CAPACITY);
        let cache = HistoryCache::from_config(&config)?;
        assert_eq!(cache.config().max_keys, 3);
        Ok(())
    }
}
