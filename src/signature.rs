use std::{collections::BTreeSet, fmt};

use crate::{
    any::Value,
    descriptor::InjectionPoint,
    errors::SignatureErrorKind,
    key::Key,
};

/// Declared parameter list of a consumer.
///
/// Rust has no runtime signature reflection, so consumers declare their
/// parameters through this builder. Declaration order is the resolution
/// order.
#[derive(Clone, Default)]
pub struct Signature {
    params: Vec<(Key, ParamDecl)>,
}

#[derive(Clone)]
enum ParamDecl {
    /// Required parameter without a descriptor; the name doubles as the
    /// dependency key.
    Required,
    /// Parameter carrying an explicit injection-point descriptor; the name is
    /// irrelevant to resolution.
    Explicit(InjectionPoint),
    /// Parameter with a plain default value; never injected.
    Defaulted(Value),
}

impl Signature {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    #[inline]
    #[must_use]
    pub fn required(mut self, name: impl Into<Key>) -> Self {
        self.params.push((name.into(), ParamDecl::Required));
        self
    }

    #[inline]
    #[must_use]
    pub fn explicit(mut self, name: impl Into<Key>, point: InjectionPoint) -> Self {
        self.params.push((name.into(), ParamDecl::Explicit(point)));
        self
    }

    #[inline]
    #[must_use]
    pub fn defaulted<T: Send + Sync + 'static>(mut self, name: impl Into<Key>, default: T) -> Self {
        self.params.push((name.into(), ParamDecl::Defaulted(crate::any::value(default))));
        self
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Classifies every declared parameter into a binding plan.
    ///
    /// Pure function of the declaration; the result is cached per consumer.
    ///
    /// # Errors
    /// - [`SignatureErrorKind::EmptyKey`] if a descriptor has an empty key
    /// - [`SignatureErrorKind::DuplicateParameter`] if a name is declared twice
    pub(crate) fn analyze(&self) -> Result<BindingPlan, SignatureErrorKind> {
        let mut seen = BTreeSet::new();
        let mut bindings = Vec::with_capacity(self.params.len());

        for (name, decl) in &self.params {
            if !seen.insert(name.clone()) {
                return Err(SignatureErrorKind::DuplicateParameter {
                    param: name.as_str().into(),
                });
            }

            let kind = match decl {
                ParamDecl::Required => BindingKind::Implicit {
                    point: InjectionPoint::new(name.clone()),
                },
                ParamDecl::Explicit(point) => {
                    if point.key().is_empty() {
                        return Err(SignatureErrorKind::EmptyKey {
                            param: name.as_str().into(),
                        });
                    }
                    BindingKind::Explicit { point: point.clone() }
                }
                ParamDecl::Defaulted(default) => BindingKind::NotInjected {
                    default: default.clone(),
                },
            };

            bindings.push(Binding {
                name: name.clone(),
                kind,
            });
        }

        Ok(BindingPlan { bindings })
    }
}

#[derive(Clone, Debug)]
pub(crate) struct BindingPlan {
    bindings: Vec<Binding>,
}

impl BindingPlan {
    #[inline]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Binding {
    pub(crate) name: Key,
    pub(crate) kind: BindingKind,
}

#[derive(Clone)]
pub(crate) enum BindingKind {
    NotInjected { default: Value },
    Implicit { point: InjectionPoint },
    Explicit { point: InjectionPoint },
}

// Manual impl: a default is an opaque `dyn Any`, only its presence is shown.
impl fmt::Debug for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInjected { .. } => f.write_str("NotInjected"),
            Self::Implicit { point } => f.debug_struct("Implicit").field("point", point).finish(),
            Self::Explicit { point } => f.debug_struct("Explicit").field("point", point).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BindingKind, Signature};
    use crate::{descriptor::inject, errors::SignatureErrorKind};

    #[test]
    fn test_classification() {
        let plan = Signature::new()
            .required("db")
            .explicit("conn", inject("database").with("name", "primary"))
            .defaulted("limit", 10i32)
            .analyze()
            .unwrap();

        let bindings: Vec<_> = plan.iter().collect();
        assert_eq!(bindings.len(), 3);

        match &bindings[0].kind {
            BindingKind::Implicit { point } => assert_eq!(point.key().as_str(), "db"),
            _ => panic!("required parameter should be implicit"),
        }
        match &bindings[1].kind {
            BindingKind::Explicit { point } => {
                assert_eq!(point.key().as_str(), "database");
                assert_eq!(point.config().get_str("name"), Some("primary"));
            }
            _ => panic!("descriptor parameter should be explicit"),
        }
        match &bindings[2].kind {
            BindingKind::NotInjected { default } => {
                assert_eq!(*default.clone().downcast::<i32>().unwrap(), 10);
            }
            _ => panic!("defaulted parameter should not be injected"),
        }

        let rendered = format!("{plan:?}");
        assert!(rendered.contains("Implicit"));
        assert!(rendered.contains("NotInjected"));
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = Signature::new().explicit("db", inject("")).analyze().unwrap_err();
        assert!(matches!(err, SignatureErrorKind::EmptyKey { param } if &*param == "db"));
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let err = Signature::new().required("db").required("db").analyze().unwrap_err();
        assert!(matches!(err, SignatureErrorKind::DuplicateParameter { param } if &*param == "db"));
    }
}
