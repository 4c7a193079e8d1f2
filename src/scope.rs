/// Lifetime partition for cached resolved values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Scope {
    /// One top-level injected call, including everything it recursively
    /// injects. Discarded when the call completes, on success or failure.
    #[default]
    Local,
    /// The injector's entire lifetime.
    App,
}

impl Scope {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Scope::Local => "local",
            Scope::App => "app",
        }
    }
}
