//! Type-erased runtime values flowing through conversion paths.

use std::any::{Any, TypeId};
use std::fmt;

use super::key::TypeKey;

/// A runtime value together with the type it is labelled as.
///
/// Values built with [`Value::new`] are labelled with their Rust type.
/// [`Value::labeled`] attaches a caller-defined [`TypeKey::named`] category
/// instead, e.g. a `String` that should be treated as `"TYPE_A"`.
pub struct Value {
    label: TypeKey,
    inner: Box<dyn Any + Send>,
}

impl Value {
    /// Wrap a value, labelled with its own Rust type.
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            label: TypeKey::of::<T>(),
            inner: Box::new(value),
        }
    }

    /// Wrap a value under a caller-defined category.
    pub fn labeled<T: Any + Send>(label: impl Into<std::sync::Arc<str>>, value: T) -> Self {
        Self {
            label: TypeKey::named(label),
            inner: Box::new(value),
        }
    }

    /// The type this value is currently labelled as.
    pub fn type_key(&self) -> &TypeKey {
        &self.label
    }

    /// `TypeId` of the wrapped Rust value.
    pub fn inner_type_id(&self) -> TypeId {
        (*self.inner).type_id()
    }

    /// Whether `key` may label this value.
    ///
    /// Named keys are opaque and accept anything; native keys must match the
    /// wrapped Rust type.
    pub fn fits(&self, key: &TypeKey) -> bool {
        key.type_id().map_or(true, |id| id == self.inner_type_id())
    }

    /// Whether the wrapped value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the wrapped value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Take the wrapped value as `T`, or give the value back.
    pub fn downcast<T: Any>(self) -> Result<T, Value> {
        let label = self.label;
        match self.inner.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(inner) => Err(Value { label, inner }),
        }
    }

    /// Replace the label. Callers check [`Value::fits`] first.
    pub(crate) fn relabel(mut self, label: TypeKey) -> Self {
        self.label = label;
        self
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value").field("type", &self.label.name()).finish()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.downcast_ref::<String>() {
            write!(f, "{:?}", s)
        } else if let Some(s) = self.downcast_ref::<&'static str>() {
            write!(f, "{:?}", s)
        } else if let Some(n) = self.downcast_ref::<i64>() {
            write!(f, "{}", n)
        } else if let Some(n) = self.downcast_ref::<f64>() {
            write!(f, "{:?}", n)
        } else if let Some(b) = self.downcast_ref::<bool>() {
            write!(f, "{}", b)
        } else {
            write!(f, "<{}>", self.label)
        }
    }
}
