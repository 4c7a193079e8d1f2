use std::sync::Arc;

use crate::{any::Value, consumer::Consumer, descriptor::InjectionPoint};

type ProviderFn = dyn Fn() -> anyhow::Result<Value> + Send + Sync;
type ResolverFn = dyn Fn(&InjectionPoint) -> anyhow::Result<Provider> + Send + Sync;

/// Produces a dependency value on each invocation.
#[derive(Clone)]
pub struct Provider {
    pub(crate) inner: ProviderInner,
}

#[derive(Clone)]
pub(crate) enum ProviderInner {
    Fn(Arc<ProviderFn>),
    /// A provider that itself declares injection points. It is injected
    /// recursively within the caller's local scope and its return value is
    /// the dependency value.
    Injected(Consumer),
}

impl Provider {
    #[inline]
    #[must_use]
    pub fn from_fn(provider: impl Fn() -> anyhow::Result<Value> + Send + Sync + 'static) -> Self {
        Self {
            inner: ProviderInner::Fn(Arc::new(provider)),
        }
    }

    /// A provider that hands out the same value on every invocation.
    #[must_use]
    pub fn singleton<T: Send + Sync + 'static>(val: T) -> Self {
        let value: Value = Arc::new(val);
        Self::from_fn(move || Ok(value.clone()))
    }

    #[inline]
    #[must_use]
    pub fn injected(consumer: Consumer) -> Self {
        Self {
            inner: ProviderInner::Injected(consumer),
        }
    }
}

/// Produces a [`Provider`] from injection-point configuration.
///
/// Invoked at most once per distinct (key, configuration) pair for the
/// lifetime of its registration; the returned provider is cached.
#[derive(Clone)]
pub struct Resolver {
    pub(crate) inner: ResolverInner,
}

#[derive(Clone)]
pub(crate) enum ResolverInner {
    Fn(Arc<ResolverFn>),
    /// A resolver that itself declares injection points. It is injected
    /// within the caller's local scope, with the point's configuration
    /// entries passed as overriding arguments.
    Injected(Consumer),
}

impl Resolver {
    #[inline]
    #[must_use]
    pub fn new(resolver: impl Fn(&InjectionPoint) -> anyhow::Result<Provider> + Send + Sync + 'static) -> Self {
        Self {
            inner: ResolverInner::Fn(Arc::new(resolver)),
        }
    }

    /// A resolver with dependencies of its own.
    ///
    /// The consumer runs within the local scope of the call that first needs
    /// the provider. Each configuration entry of the injection point arrives
    /// as an overriding argument of type [`ConfigValue`](crate::ConfigValue),
    /// keyed by the entry name; remaining parameters are injected as usual.
    /// The consumer must return a boxed [`Provider`].
    #[inline]
    #[must_use]
    pub fn injected(consumer: Consumer) -> Self {
        Self {
            inner: ResolverInner::Injected(consumer),
        }
    }
}
