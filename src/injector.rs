use std::sync::{Arc, Weak};

use anyhow::anyhow;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, debug_span, error, warn};

use crate::{
    any::{self, value, Value},
    cache::Cache,
    consumer::{Consumer, Kwargs},
    context::Context,
    descriptor::InjectionPoint,
    errors::InjectErrorKind,
    key::Key,
    provider::{Provider, ProviderInner, Resolver},
    registry::{ProviderSource, Registration, Registry},
    scope::Scope,
    signature::{BindingKind, BindingPlan},
};

/// When to surface a missing registration for an implicit injection point.
///
/// Explicit points always fail before any provider runs; this policy only
/// concerns points inferred from required parameter names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImplicitPolicy {
    /// Verify every needed implicit key is resolvable before any provider
    /// runs.
    #[default]
    FailFast,
    /// Defer the failure to the moment the parameter is actually resolved;
    /// providers for earlier parameters may already have run.
    Lazy,
}

struct InjectorInner {
    registry: RwLock<Registry>,
    app_cache: Mutex<any::Map>,
    policy: ImplicitPolicy,
}

/// Orchestrator owning the registry and the scope caches.
///
/// Cloning is cheap and all clones share state. Each top-level
/// [`inject`](Self::inject) call owns an independent local scope, so
/// concurrent calls are isolated without locking as long as the registered
/// providers and resolvers are themselves safe to call concurrently.
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl Injector {
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(ImplicitPolicy::default())
    }

    #[must_use]
    pub fn with_policy(policy: ImplicitPolicy) -> Self {
        let injector = Self {
            inner: Arc::new(InjectorInner {
                registry: RwLock::new(Registry::new()),
                app_cache: Mutex::new(any::Map::new()),
                policy,
            }),
        };
        injector.register_defaults();
        injector
    }

    /// Registers the entries every injector ships with: `injector` (app
    /// scope, the injector itself) and `request`/`response` with their
    /// aliases (local scope, to be seeded by the host per call). All of them
    /// are ordinary registrations and may be removed.
    fn register_defaults(&self) {
        // A weak self-reference, otherwise the registry would pin its own
        // injector forever. The app cache still pins it once `injector` has
        // been resolved; `remove("injector")` evicts that entry.
        let weak = Arc::downgrade(&self.inner);
        self.add_provider_with_scope(
            "injector",
            Provider::from_fn(move || match Weak::upgrade(&weak) {
                Some(inner) => Ok(value(Injector { inner })),
                None => Err(anyhow!("injector was dropped")),
            }),
            Scope::App,
        );

        self.add_provider("request", host_seeded("request"));
        self.add_provider("response", host_seeded("response"));
        self.alias("req", "request");
        self.alias("rq", "request");
        self.alias("res", "response");
        self.alias("rs", "response");
    }

    /// Registers a local-scoped provider for the key, replacing any previous
    /// registration.
    pub fn add_provider(&self, key: impl Into<Key>, provider: Provider) {
        self.add_provider_with_scope(key, provider, Scope::Local);
    }

    pub fn add_provider_with_scope(&self, key: impl Into<Key>, provider: Provider, scope: Scope) {
        let key = key.into();
        self.evict_app_entries(key.as_str());
        self.inner.registry.write().register(key, Registration::provider(provider, scope));
    }

    /// Registers a local-scoped resolver for the key, replacing any previous
    /// registration together with its cached providers.
    pub fn add_resolver(&self, key: impl Into<Key>, resolver: Resolver) {
        self.add_resolver_with_scope(key, resolver, Scope::Local);
    }

    pub fn add_resolver_with_scope(&self, key: impl Into<Key>, resolver: Resolver, scope: Scope) {
        let key = key.into();
        self.evict_app_entries(key.as_str());
        self.inner.registry.write().register(key, Registration::resolver(resolver, scope));
    }

    /// Registers a singleton value: app-scoped, the same value for every
    /// injection.
    pub fn add_value<T: Send + Sync + 'static>(&self, key: impl Into<Key>, val: T) {
        self.add_provider_with_scope(key, Provider::singleton(val), Scope::App);
    }

    /// Makes `alias` an alternative name for `target`'s registration.
    /// Returns `false` if the target is not registered.
    pub fn alias(&self, alias: impl Into<Key>, target: &str) -> bool {
        self.inner.registry.write().alias(alias.into(), target)
    }

    /// Removes the registration or alias for the key. Removing a
    /// registration also evicts its app-scoped values; subsequent resolution
    /// of the key fails until re-registered.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.inner.registry.write().remove(key);
        if removed {
            self.evict_app_entries(key);
        }
        removed
    }

    /// Binds a consumer to this injector.
    #[inline]
    #[must_use]
    pub fn wrap(&self, consumer: Consumer) -> Wrapped {
        Wrapped {
            injector: self.clone(),
            consumer,
        }
    }

    /// Injects and invokes a consumer as a top-level call with a fresh local
    /// scope.
    ///
    /// Caller-supplied `overrides` always win over injection: an overridden
    /// parameter never triggers resolution.
    ///
    /// # Errors
    /// See [`InjectErrorKind`]. User errors from providers, resolvers and
    /// the consumer body are passed through unchanged as error sources; the
    /// local scope is discarded on every exit path.
    pub fn inject(&self, consumer: &Consumer, overrides: Kwargs) -> Result<Value, InjectErrorKind> {
        self.inject_with_context(consumer, Context::new(), overrides)
    }

    /// Like [`inject`](Self::inject), with host-supplied values seeded into
    /// the call's local scope first. This is the entry point for a host
    /// runtime binding its request/response equivalents per unit of work.
    pub fn inject_with_context(&self, consumer: &Consumer, context: Context, overrides: Kwargs) -> Result<Value, InjectErrorKind> {
        let mut local = Cache::seeded(context);
        self.inject_in(consumer, overrides, &mut local)
    }

    /// Injection within an existing call context. Recursive injection of
    /// providers lands here with the caller's local scope, never a new one.
    fn inject_in(&self, consumer: &Consumer, overrides: Kwargs, local: &mut Cache) -> Result<Value, InjectErrorKind> {
        let plan = consumer.plan()?;
        self.check_unresolvable(plan, &overrides, local)?;

        let mut kwargs = overrides;
        for binding in plan.iter() {
            if kwargs.contains(binding.name.as_str()) {
                continue;
            }
            match &binding.kind {
                BindingKind::NotInjected { default } => {
                    kwargs.insert_value(binding.name.clone(), default.clone());
                }
                BindingKind::Implicit { point } | BindingKind::Explicit { point } => {
                    let resolved = self.resolve(point, local)?;
                    kwargs.insert_value(binding.name.clone(), resolved);
                }
            }
        }

        consumer.call(kwargs).map_err(InjectErrorKind::Consumer)
    }

    /// Fail-fast pass over the plan: explicit points always, implicit points
    /// under [`ImplicitPolicy::FailFast`]. Overridden and seeded parameters
    /// are exempt.
    fn check_unresolvable(&self, plan: &BindingPlan, overrides: &Kwargs, local: &Cache) -> Result<(), InjectErrorKind> {
        let registry = self.inner.registry.read();
        for binding in plan.iter() {
            let point = match &binding.kind {
                BindingKind::Explicit { point } => point,
                BindingKind::Implicit { point } if self.inner.policy == ImplicitPolicy::FailFast => point,
                _ => continue,
            };
            if overrides.contains(binding.name.as_str()) || local.contains(point.key(), point.config()) {
                continue;
            }
            if registry.get(point.key().as_str()).is_none() {
                let err = InjectErrorKind::Unresolved {
                    key: point.key().clone(),
                };
                warn!("{}", err);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Resolves one injection point within the given local scope.
    fn resolve(&self, point: &InjectionPoint, local: &mut Cache) -> Result<Value, InjectErrorKind> {
        let key = point.key();
        let span = debug_span!("resolve", key = %key);
        let _guard = span.enter();

        let cache_key = (key.clone(), point.config().clone());
        if let Some(resolved) = local.get(&cache_key) {
            debug!("Found in local scope");
            return Ok(resolved);
        }
        if let Some(resolved) = self.inner.app_cache.lock().get(&cache_key) {
            debug!("Found in app scope");
            return Ok(resolved.clone());
        }

        let Some((canonical, registration)) = self.inner.registry.read().get(key.as_str()) else {
            let err = InjectErrorKind::Unresolved { key: key.clone() };
            warn!("{}", err);
            return Err(err);
        };

        // Aliases cache under their canonical key so every name for a
        // registration shares one value per call.
        let cache_key = (canonical.clone(), point.config().clone());
        if canonical != *key {
            if let Some(resolved) = local.get(&cache_key) {
                debug!("Found in local scope under canonical key");
                return Ok(resolved);
            }
            if let Some(resolved) = self.inner.app_cache.lock().get(&cache_key) {
                debug!("Found in app scope under canonical key");
                return Ok(resolved.clone());
            }
        }

        // The chain is cyclic only when the same key recurs under the same
        // configuration; one key resolved under distinct configurations is a
        // legitimate chain.
        if !local.enter(&cache_key) {
            let err = InjectErrorKind::Cyclic { key: canonical };
            error!("{}", err);
            return Err(err);
        }
        let result = self.invoke(&registration, point, local);
        local.exit(&cache_key);
        let resolved = result?;

        match registration.scope {
            Scope::Local => {
                local.insert(cache_key, resolved.clone());
                debug!("Cached in local scope");
                Ok(resolved)
            }
            Scope::App => {
                // Insert-if-absent: concurrent first resolutions of the same
                // key converge on whichever value landed first.
                let resolved = self
                    .inner
                    .app_cache
                    .lock()
                    .entry(cache_key)
                    .or_insert(resolved)
                    .clone();
                debug!("Cached in app scope");
                Ok(resolved)
            }
        }
    }

    /// Invokes the registration's provider, resolving it through the
    /// registration first if it is a resolver.
    fn invoke(&self, registration: &Registration, point: &InjectionPoint, local: &mut Cache) -> Result<Value, InjectErrorKind> {
        let provider = match registration.provider_for(point)? {
            ProviderSource::Ready(provider) => provider,
            ProviderSource::Inject(resolver) => {
                let produced = self.run_injected_resolver(&resolver, point, local)?;
                registration.store_provider(point.config().clone(), produced)
            }
        };
        match &provider.inner {
            ProviderInner::Fn(provider) => provider().map_err(|source| {
                let err = InjectErrorKind::Provider {
                    key: point.key().clone(),
                    source,
                };
                error!("{}", err);
                err
            }),
            ProviderInner::Injected(consumer) => self.inject_in(consumer, Kwargs::new(), local),
        }
    }

    /// Runs an injected resolver within the caller's call context. The
    /// point's configuration entries are passed as overriding arguments;
    /// the remaining parameters are injected like any consumer's. The
    /// consumer must return a boxed [`Provider`].
    fn run_injected_resolver(&self, resolver: &Consumer, point: &InjectionPoint, local: &mut Cache) -> Result<Provider, InjectErrorKind> {
        let mut overrides = Kwargs::new();
        for (name, val) in point.config().iter() {
            overrides.insert(name, val.clone());
        }

        let produced = self.inject_in(resolver, overrides, local)?;
        match produced.downcast::<Provider>() {
            Ok(provider) => Ok((*provider).clone()),
            Err(_) => {
                let err = InjectErrorKind::Resolver {
                    key: point.key().clone(),
                    source: anyhow!("resolver did not return a provider"),
                };
                error!("{}", err);
                Err(err)
            }
        }
    }

    fn evict_app_entries(&self, key: &str) {
        self.inner
            .app_cache
            .lock()
            .retain(|(cached, _), _| cached.as_str() != key);
    }
}

/// Pre-registered provider for a host-seeded key. Resolution only reaches it
/// when the host did not seed the call context, which is an error.
fn host_seeded(key: &'static str) -> Provider {
    Provider::from_fn(move || {
        Err(anyhow!(
            "no {key} bound to the current call; the host must seed it into the call context"
        ))
    })
}

/// A consumer bound to an injector.
#[derive(Clone)]
pub struct Wrapped {
    injector: Injector,
    consumer: Consumer,
}

impl Wrapped {
    /// # Errors
    /// See [`Injector::inject`].
    pub fn call(&self, overrides: Kwargs) -> Result<Value, InjectErrorKind> {
        self.injector.inject(&self.consumer, overrides)
    }

    /// # Errors
    /// See [`Injector::inject_with_context`].
    pub fn call_with_context(&self, context: Context, overrides: Kwargs) -> Result<Value, InjectErrorKind> {
        self.injector.inject_with_context(&self.consumer, context, overrides)
    }

    #[inline]
    #[must_use]
    pub fn consumer(&self) -> &Consumer {
        &self.consumer
    }

    #[inline]
    #[must_use]
    pub fn injector(&self) -> &Injector {
        &self.injector
    }
}
