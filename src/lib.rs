pub(crate) mod any;
pub(crate) mod cache;
pub(crate) mod consumer;
pub(crate) mod context;
pub(crate) mod descriptor;
pub(crate) mod errors;
pub(crate) mod injector;
pub(crate) mod key;
pub(crate) mod provider;
pub(crate) mod registry;
pub(crate) mod scope;
pub(crate) mod signature;

pub use any::{value, Value};
pub use consumer::{Consumer, Kwargs};
pub use context::Context;
pub use descriptor::{inject, Config, ConfigValue, InjectionPoint};
pub use errors::{InjectErrorKind, SignatureErrorKind};
pub use injector::{ImplicitPolicy, Injector, Wrapped};
pub use key::Key;
pub use provider::{Provider, Resolver};
pub use scope::Scope;
pub use signature::Signature;
