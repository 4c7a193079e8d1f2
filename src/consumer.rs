use std::{
    collections::BTreeMap,
    sync::{Arc, OnceLock},
};

use anyhow::anyhow;

use crate::{
    any::Value,
    errors::SignatureErrorKind,
    key::Key,
    signature::{BindingPlan, Signature},
};

/// Keyword arguments assembled for one consumer invocation.
///
/// Holds caller-supplied overrides merged with resolved dependency values.
#[derive(Clone, Default)]
pub struct Kwargs {
    map: BTreeMap<Key, Value>,
}

impl Kwargs {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { map: BTreeMap::new() }
    }

    #[inline]
    #[must_use]
    pub fn with<T: Send + Sync + 'static>(mut self, name: impl Into<Key>, value: T) -> Self {
        self.insert(name, value);
        self
    }

    #[inline]
    pub fn insert<T: Send + Sync + 'static>(&mut self, name: impl Into<Key>, value: T) -> Option<Value> {
        self.map.insert(name.into(), crate::any::value(value))
    }

    #[inline]
    pub fn insert_value(&mut self, name: impl Into<Key>, value: Value) -> Option<Value> {
        self.map.insert(name.into(), value)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.map.get(name).and_then(|value| value.clone().downcast().ok())
    }

    #[inline]
    #[must_use]
    pub fn get_value(&self, name: &str) -> Option<Value> {
        self.map.get(name).cloned()
    }

    /// Typed access to an argument that must be present.
    ///
    /// # Errors
    /// Returns an error if the argument is missing or holds a different type.
    pub fn require<T: Send + Sync + 'static>(&self, name: &str) -> anyhow::Result<Arc<T>> {
        self.map
            .get(name)
            .ok_or_else(|| anyhow!("missing argument {name:?}"))?
            .clone()
            .downcast()
            .map_err(|_| anyhow!("argument {name:?} has an unexpected type"))
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }
}

struct ConsumerInner {
    signature: Signature,
    body: Box<dyn Fn(Kwargs) -> anyhow::Result<Value> + Send + Sync>,
    plan: OnceLock<BindingPlan>,
}

/// A callable with declared injection points.
///
/// Cheap to clone; the binding plan is computed once on first injection and
/// shared by all clones, since signatures never change at runtime.
#[derive(Clone)]
pub struct Consumer {
    inner: Arc<ConsumerInner>,
}

impl Consumer {
    #[must_use]
    pub fn new(
        signature: Signature,
        body: impl Fn(Kwargs) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(ConsumerInner {
                signature,
                body: Box::new(body),
                plan: OnceLock::new(),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.inner.signature
    }

    pub(crate) fn plan(&self) -> Result<&BindingPlan, SignatureErrorKind> {
        if let Some(plan) = self.inner.plan.get() {
            return Ok(plan);
        }
        let plan = self.inner.signature.analyze()?;
        Ok(self.inner.plan.get_or_init(|| plan))
    }

    #[inline]
    pub(crate) fn call(&self, kwargs: Kwargs) -> anyhow::Result<Value> {
        (self.inner.body)(kwargs)
    }
}
