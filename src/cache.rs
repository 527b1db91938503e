use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

/// Values fetched on first demand and kept until explicitly invalidated.
///
/// A failed fetch stores nothing, so the next demand fetches again. An empty
/// value (e.g. an image with no comments) is cached like any other.
#[derive(Debug)]
pub struct OnDemandCache<K, V> {
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash, V> Default for OnDemandCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> OnDemandCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    /// Drops the entry so the next `get_or_fetch` goes back to the source.
    pub fn invalidate(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub async fn get_or_fetch<F, Fut, E>(&mut self, key: K, fetch: F) -> Result<&V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let value = fetch().await?;
                Ok(entry.insert(value))
            }
        }
    }
}
