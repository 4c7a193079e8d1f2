use std::{any::Any, collections::BTreeMap, sync::Arc};

use crate::{descriptor::Config, key::Key};

/// An opaque dependency value.
///
/// The engine never looks inside a value; providers box whatever they
/// produce and consumers downcast it back.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Boxes a dependency value for transport through the engine.
#[inline]
#[must_use]
pub fn value<T: Send + Sync + 'static>(val: T) -> Value {
    Arc::new(val)
}

pub(crate) type CacheKey = (Key, Config);
pub(crate) type Map = BTreeMap<CacheKey, Value>;
