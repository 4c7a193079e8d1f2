use std::collections::BTreeMap;

use crate::key::Key;

/// Marks a parameter as an explicit injection point.
///
/// The descriptor names the registry entry that fills the parameter and may
/// carry point-specific configuration for a resolver. Two descriptors with
/// equal key and configuration are interchangeable.
///
/// Usage:
/// ```
/// use infuse::inject;
///
/// let point = inject("db").with("name", "primary");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct InjectionPoint {
    key: Key,
    config: Config,
}

impl InjectionPoint {
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            config: Config::new(),
        }
    }

    /// Adds a configuration entry passed to the resolver of the dependency.
    #[inline]
    #[must_use]
    pub fn with(mut self, name: impl Into<Box<str>>, value: impl Into<ConfigValue>) -> Self {
        self.config.set(name, value);
        self
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Shorthand for [`InjectionPoint::new`].
#[inline]
#[must_use]
pub fn inject(key: impl Into<Key>) -> InjectionPoint {
    InjectionPoint::new(key)
}

/// Injection-point configuration forwarded to a resolver.
///
/// Part of the scope-cache key, so resolution of the same key with different
/// configurations yields distinct values.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Config(BTreeMap<Box<str>, ConfigValue>);

impl Config {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    #[inline]
    pub fn set(&mut self, name: impl Into<Box<str>>, value: impl Into<ConfigValue>) -> Option<ConfigValue> {
        self.0.insert(name.into(), value.into())
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.0.get(name)
    }

    #[inline]
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ConfigValue::Str(val)) => Some(val),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(ConfigValue::Int(val)) => Some(*val),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(ConfigValue::Bool(val)) => Some(*val),
            _ => None,
        }
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.0.iter().map(|(name, val)| (name.as_ref(), val))
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A single configuration entry of an [`InjectionPoint`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigValue {
    Str(Box<str>),
    Int(i64),
    Bool(bool),
}

impl From<&str> for ConfigValue {
    #[inline]
    fn from(val: &str) -> Self {
        Self::Str(val.into())
    }
}

impl From<String> for ConfigValue {
    #[inline]
    fn from(val: String) -> Self {
        Self::Str(val.into())
    }
}

impl From<i64> for ConfigValue {
    #[inline]
    fn from(val: i64) -> Self {
        Self::Int(val)
    }
}

impl From<bool> for ConfigValue {
    #[inline]
    fn from(val: bool) -> Self {
        Self::Bool(val)
    }
}

#[cfg(test)]
mod tests {
    use super::inject;

    #[test]
    fn test_descriptor_equality() {
        let first = inject("db").with("name", "primary").with("pool", 4i64);
        let second = inject("db").with("pool", 4i64).with("name", "primary");
        let other = inject("db").with("name", "replica");

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn test_config_accessors() {
        let point = inject("param")
            .with("name", "id")
            .with("limit", 10i64)
            .with("strict", true);

        let config = point.config();
        assert_eq!(config.get_str("name"), Some("id"));
        assert_eq!(config.get_int("limit"), Some(10));
        assert_eq!(config.get_bool("strict"), Some(true));
        assert_eq!(config.get_str("limit"), None);
        assert_eq!(config.get("missing"), None);
        assert_eq!(config.len(), 3);
    }
}
