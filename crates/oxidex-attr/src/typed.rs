//! Type-checked attributes.
//!
//! A [`TypedResolver`] is a data resolver that stores its value in the
//! instance store under its own name and rejects writes of the wrong
//! [`ValueKind`].

use crate::error::Error;
use crate::resolver::Resolver;
use crate::value::ValueKind;

/// A data resolver accepting only values of one kind.
///
/// # Example
///
/// ```rust
/// use oxidex_attr::{Error, Runtime, TypedResolver, ValueKind};
///
/// let rt = Runtime::new();
/// let stock = rt.declare_type("Stock", &[]).unwrap();
/// rt.attach_resolver(stock, "shares", TypedResolver::new(ValueKind::Int)).unwrap();
///
/// let s = rt.create_instance(stock).unwrap();
/// rt.write(&s, "shares", 50).unwrap();
/// assert!(matches!(
///     rt.write(&s, "shares", "fifty"),
///     Err(Error::TypeMismatch { .. })
/// ));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedResolver {
    kind: ValueKind,
}

impl TypedResolver {
    #[must_use]
    pub const fn new(kind: ValueKind) -> Self {
        TypedResolver { kind }
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    #[must_use]
    pub fn build(self) -> Resolver {
        let kind = self.kind;
        Resolver::builder()
            .getter(|access| {
                access
                    .store_get(access.name().as_str())
                    .ok_or_else(|| access.not_found())
            })
            .setter(move |access, value| {
                if value.kind() != kind {
                    return Err(Error::TypeMismatch {
                        name: access.name(),
                        expected: kind,
                        found: value.kind(),
                    });
                }
                access.store_set(access.name().as_str(), value);
                Ok(())
            })
            .deleter(|access| {
                access
                    .store_remove(access.name().as_str())
                    .map(drop)
                    .ok_or_else(|| access.not_found())
            })
            .build()
    }
}

impl From<TypedResolver> for Resolver {
    fn from(typed: TypedResolver) -> Self {
        typed.build()
    }
}
