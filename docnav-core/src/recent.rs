//! Recently committed search terms

use crate::highlight::fold_case;
use crate::store::KeyValueStore;

/// Most-recent-first list of search terms kept in a [`KeyValueStore`]
///
/// Every operation reads the stored list, so several pages sharing a store
/// see each other's terms. Storage errors degrade to an empty list.
#[derive(Debug, Clone)]
pub struct RecentQueries {
    key: String,
    max: usize,
}

impl RecentQueries {
    pub fn new(app_name: &str, max: usize) -> Self {
        Self {
            key: format!("{}.search.recent", app_name),
            max,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Stored terms; anything that is not a JSON array of strings reads as empty
    pub fn load(&self, store: &dyn KeyValueStore) -> Vec<String> {
        let raw = match store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("failed to read recent searches: {:#}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            Ok(_) => Vec::new(),
            Err(e) => {
                log::debug!("malformed recent searches ignored: {}", e);
                Vec::new()
            }
        }
    }

    fn save(&self, store: &mut dyn KeyValueStore, list: &[String]) {
        let result = serde_json::to_string(list)
            .map_err(anyhow::Error::from)
            .and_then(|json| store.set(&self.key, &json));
        if let Err(e) = result {
            log::warn!("failed to save recent searches: {:#}", e);
        }
    }

    /// Move `term` to the front, dropping duplicates and the oldest overflow
    pub fn add(&self, store: &mut dyn KeyValueStore, term: &str) {
        let clean = term.trim();
        if clean.is_empty() {
            return;
        }
        let mut list: Vec<String> = self
            .load(store)
            .into_iter()
            .filter(|item| item != clean)
            .collect();
        list.insert(0, clean.to_string());
        list.truncate(self.max);
        self.save(store, &list);
    }

    pub fn remove(&self, store: &mut dyn KeyValueStore, term: &str) {
        let list: Vec<String> = self
            .load(store)
            .into_iter()
            .filter(|item| item != term)
            .collect();
        self.save(store, &list);
    }

    pub fn clear(&self, store: &mut dyn KeyValueStore) {
        if let Err(e) = store.remove(&self.key) {
            log::debug!("remove failed ({:#}), storing empty list", e);
            self.save(store, &[]);
        }
    }

    /// Terms containing `filter`, case-insensitively, at most `max` of them
    pub fn filtered(&self, store: &dyn KeyValueStore, filter: &str) -> Vec<String> {
        let term = fold_case(filter.trim());
        self.load(store)
            .into_iter()
            .filter(|item| term.is_empty() || fold_case(item).contains(&term))
            .take(self.max)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::BrokenStore;
    use crate::store::MemoryStore;

    fn recent() -> RecentQueries {
        RecentQueries::new("docnav", 5)
    }

    #[test]
    fn test_key_uses_app_name() {
        assert_eq!(RecentQueries::new("taskiba", 5).key(), "taskiba.search.recent");
    }

    #[test]
    fn test_cap_keeps_five_most_recent() {
        let mut store = MemoryStore::new();
        let r = recent();
        for term in ["one", "two", "three", "four", "five", "six"] {
            r.add(&mut store, term);
        }
        assert_eq!(r.load(&store), vec!["six", "five", "four", "three", "two"]);
    }

    #[test]
    fn test_add_dedupes_and_trims() {
        let mut store = MemoryStore::new();
        let r = recent();
        r.add(&mut store, "alpha");
        r.add(&mut store, "beta");
        r.add(&mut store, "  alpha ");
        r.add(&mut store, "   ");
        assert_eq!(r.load(&store), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_malformed_storage_reads_empty() {
        let mut store = MemoryStore::new();
        let r = recent();
        store.set(r.key(), "{oops").unwrap();
        assert!(r.load(&store).is_empty());

        store.set(r.key(), "{\"a\": 1}").unwrap();
        assert!(r.load(&store).is_empty());

        store.set(r.key(), "[\"ok\", 3, null, \"fine\"]").unwrap();
        assert_eq!(r.load(&store), vec!["ok", "fine"]);
    }

    #[test]
    fn test_broken_storage_is_silent() {
        let mut store = BrokenStore;
        let r = recent();
        r.add(&mut store, "term");
        r.clear(&mut store);
        assert!(r.load(&store).is_empty());
    }

    #[test]
    fn test_filtered_and_remove() {
        let mut store = MemoryStore::new();
        let r = recent();
        for term in ["Install", "config", "installer"] {
            r.add(&mut store, term);
        }
        assert_eq!(r.filtered(&store, " INST "), vec!["installer", "Install"]);
        assert_eq!(r.filtered(&store, "").len(), 3);

        r.remove(&mut store, "installer");
        assert_eq!(r.load(&store), vec!["config", "Install"]);

        r.clear(&mut store);
        assert!(r.load(&store).is_empty());
    }
}
