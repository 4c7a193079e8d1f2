use std::{collections::BTreeMap, sync::Arc};

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    consumer::Consumer,
    descriptor::{Config, InjectionPoint},
    errors::InjectErrorKind,
    key::Key,
    provider::{Provider, Resolver, ResolverInner},
    scope::Scope,
};

/// One active entry of the registry: a provider or a resolver, plus the
/// scope its resolved values are cached in.
pub(crate) struct Registration {
    target: Target,
    pub(crate) scope: Scope,
}

enum Target {
    Provider(Provider),
    Resolver {
        resolver: Resolver,
        /// Providers already produced by the resolver, keyed by injection-point
        /// configuration. Lives as long as the registration, so the resolver
        /// runs at most once per configuration. Replacing the registration
        /// drops the cache.
        resolved: Mutex<BTreeMap<Config, Provider>>,
    },
}

impl Registration {
    #[inline]
    #[must_use]
    pub(crate) fn provider(provider: Provider, scope: Scope) -> Self {
        Self {
            target: Target::Provider(provider),
            scope,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn resolver(resolver: Resolver, scope: Scope) -> Self {
        Self {
            target: Target::Resolver {
                resolver,
                resolved: Mutex::new(BTreeMap::new()),
            },
            scope,
        }
    }

    /// Returns the provider for the given point, or the injected resolver
    /// the caller has to run within its own call context.
    ///
    /// For a plain resolver the lock is held across the invocation, so
    /// concurrent first use still runs it only once per configuration. Failed
    /// invocations are not cached. An injected resolver is handed back
    /// instead: running it here would recurse into resolution while the lock
    /// is held.
    pub(crate) fn provider_for(&self, point: &InjectionPoint) -> Result<ProviderSource, InjectErrorKind> {
        match &self.target {
            Target::Provider(provider) => Ok(ProviderSource::Ready(provider.clone())),
            Target::Resolver { resolver, resolved } => {
                let mut resolved = resolved.lock();
                if let Some(provider) = resolved.get(point.config()) {
                    debug!("Provider found in resolver cache");
                    return Ok(ProviderSource::Ready(provider.clone()));
                }

                match &resolver.inner {
                    ResolverInner::Fn(resolve) => {
                        let provider = resolve(point).map_err(|source| InjectErrorKind::Resolver {
                            key: point.key().clone(),
                            source,
                        })?;
                        resolved.insert(point.config().clone(), provider.clone());
                        debug!("Resolver invoked, provider cached");
                        Ok(ProviderSource::Ready(provider))
                    }
                    ResolverInner::Injected(consumer) => Ok(ProviderSource::Inject(consumer.clone())),
                }
            }
        }
    }

    /// Stores a provider produced by an injected resolver.
    ///
    /// Insert-if-absent: racing first resolutions of the same configuration
    /// converge on whichever provider landed first, which is returned.
    pub(crate) fn store_provider(&self, config: Config, provider: Provider) -> Provider {
        match &self.target {
            Target::Provider(_) => provider,
            Target::Resolver { resolved, .. } => resolved.lock().entry(config).or_insert(provider).clone(),
        }
    }
}

/// Outcome of looking a registration's provider up for one injection point.
pub(crate) enum ProviderSource {
    Ready(Provider),
    /// An injected resolver; the caller runs it in its call context and
    /// stores the result with [`Registration::store_provider`].
    Inject(Consumer),
}

/// Maps dependency keys to their active registration.
///
/// Mutated at setup time, read at call time. The injector guards it with a
/// read-write lock; concurrent registration while calls are in flight is
/// serialized there.
#[derive(Default)]
pub(crate) struct Registry {
    registrations: BTreeMap<Key, Arc<Registration>>,
    aliases: BTreeMap<Key, Key>,
}

impl Registry {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            registrations: BTreeMap::new(),
            aliases: BTreeMap::new(),
        }
    }

    /// Last registration wins: any previous entry for the key is replaced,
    /// together with its resolver cache.
    #[inline]
    pub(crate) fn register(&mut self, key: Key, registration: Registration) -> Option<Arc<Registration>> {
        self.registrations.insert(key, Arc::new(registration))
    }

    /// Makes `alias` resolve to `target`'s registration. The alias follows
    /// the target's canonical key, so aliased lookups share the target's
    /// caches. Returns `false` if the target is unknown.
    pub(crate) fn alias(&mut self, alias: Key, target: &str) -> bool {
        let Some((canonical, _)) = self.get(target) else {
            return false;
        };
        self.aliases.insert(alias, canonical);
        true
    }

    /// Removes the entry for the key, whether it is a registration or an
    /// alias. Removing a registration leaves its aliases dangling; removing
    /// an alias leaves the canonical registration in place.
    pub(crate) fn remove(&mut self, key: &str) -> bool {
        let alias = self.aliases.remove(key).is_some();
        self.registrations.remove(key).is_some() || alias
    }

    /// Looks up a key or an alias. Returns the canonical key together with
    /// the registration so resolved values are cached under one name.
    #[must_use]
    pub(crate) fn get(&self, key: &str) -> Option<(Key, Arc<Registration>)> {
        if let Some((canonical, registration)) = self.registrations.get_key_value(key) {
            return Some((canonical.clone(), registration.clone()));
        }
        let canonical = self.aliases.get(key)?;
        let registration = self.registrations.get(canonical.as_str())?;
        Some((canonical.clone(), registration.clone()))
    }
}
