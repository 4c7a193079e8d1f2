use crate::key::Key;

/// A malformed injection-point declaration.
#[derive(thiserror::Error, Debug)]
pub enum SignatureErrorKind {
    #[error("injection point for parameter {param:?} has an empty dependency key")]
    EmptyKey { param: Box<str> },
    #[error("parameter {param:?} is declared more than once")]
    DuplicateParameter { param: Box<str> },
}

#[derive(thiserror::Error, Debug)]
pub enum InjectErrorKind {
    #[error("no provider or resolver registered for {key}")]
    Unresolved { key: Key },
    #[error("cyclic resolution: {key} transitively depends on itself")]
    Cyclic { key: Key },
    #[error(transparent)]
    Signature(#[from] SignatureErrorKind),
    #[error("resolver for {key} failed")]
    Resolver {
        key: Key,
        #[source]
        source: anyhow::Error,
    },
    #[error("provider for {key} failed")]
    Provider {
        key: Key,
        #[source]
        source: anyhow::Error,
    },
    #[error("consumer failed")]
    Consumer(#[source] anyhow::Error),
}
