use crate::{
    any::{Map, Value},
    descriptor::Config,
    key::Key,
};

/// Values a host supplies for one unit of work.
///
/// The context is seeded into the call's local scope before resolution
/// starts, so seeded keys are found without consulting the registry. This is
/// how a host binds its request/response equivalents to the pre-registered
/// keys of [`Injector`](crate::Injector).
#[derive(Clone, Default)]
pub struct Context {
    pub(crate) map: Map,
}

impl Context {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { map: Map::new() }
    }

    #[inline]
    pub fn insert<T: Send + Sync + 'static>(&mut self, key: impl Into<Key>, value: T) -> Option<Value> {
        self.insert_value(key, crate::any::value(value))
    }

    #[inline]
    pub fn insert_value(&mut self, key: impl Into<Key>, value: Value) -> Option<Value> {
        self.map.insert((key.into(), Config::new()), value)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
