use crate::{
    any::{CacheKey, Map, Value},
    context::Context,
    descriptor::Config,
    key::Key,
};

/// Resolved values of one local scope plus the in-flight resolution stack
/// used for cycle detection.
///
/// The in-flight stack tracks `(key, config)` pairs, the same identity every
/// scope cache uses: the one key may be resolved under several
/// configurations within one chain without being cyclic.
///
/// One instance is created per top-level injected call and dropped when the
/// call completes, so local values can never leak across calls.
#[derive(Default)]
pub(crate) struct Cache {
    map: Map,
    in_flight: Vec<CacheKey>,
}

impl Cache {
    #[inline]
    #[must_use]
    #[cfg(test)]
    pub(crate) fn new() -> Self {
        Self {
            map: Map::new(),
            in_flight: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn seeded(context: Context) -> Self {
        Self {
            map: context.map,
            in_flight: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, key: &CacheKey) -> Option<Value> {
        self.map.get(key).cloned()
    }

    #[inline]
    #[must_use]
    pub(crate) fn contains(&self, key: &Key, config: &Config) -> bool {
        self.map.contains_key(&(key.clone(), config.clone()))
    }

    #[inline]
    pub(crate) fn insert(&mut self, key: CacheKey, value: Value) {
        self.map.insert(key, value);
    }

    /// Marks a `(key, config)` pair as being resolved. Returns `false` if the
    /// pair is already in flight, which means the resolution chain is cyclic.
    #[inline]
    pub(crate) fn enter(&mut self, key: &CacheKey) -> bool {
        if self.in_flight.contains(key) {
            return false;
        }
        self.in_flight.push(key.clone());
        true
    }

    #[inline]
    pub(crate) fn exit(&mut self, key: &CacheKey) {
        if let Some(position) = self.in_flight.iter().rposition(|in_flight| in_flight == key) {
            self.in_flight.remove(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Cache;
    use crate::{descriptor::Config, key::Key};

    #[test]
    fn test_in_flight_detects_reentry() {
        let mut cache = Cache::new();
        let a = (Key::from("a"), Config::new());
        let b = (Key::from("b"), Config::new());

        assert!(cache.enter(&a));
        assert!(cache.enter(&b));
        assert!(!cache.enter(&a));

        cache.exit(&b);
        assert!(cache.enter(&b));
    }

    #[test]
    fn test_in_flight_distinguishes_configs() {
        let mut cache = Cache::new();
        let mut outer_config = Config::new();
        outer_config.set("name", "outer");
        let mut inner_config = Config::new();
        inner_config.set("name", "inner");

        let outer = (Key::from("param"), outer_config);
        let inner = (Key::from("param"), inner_config);

        // Same key under a different configuration is a different dependency.
        assert!(cache.enter(&outer));
        assert!(cache.enter(&inner));
        assert!(!cache.enter(&outer));
        assert!(!cache.enter(&inner));

        cache.exit(&inner);
        assert!(cache.enter(&inner));
    }
}
