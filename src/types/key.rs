//! Type and variation keys: the addressable nodes of the conversion graph.

use serde::{Deserialize, Serialize, Serializer};
use std::any::{Any, TypeId};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identifier for a category of value.
///
/// Either a native Rust type (compared by `TypeId`) or a caller-defined
/// named label for values whose category is not expressed as a Rust type.
#[derive(Clone)]
pub struct TypeKey(Repr);

#[derive(Clone)]
enum Repr {
    Native { id: TypeId, name: &'static str },
    Named(Arc<str>),
}

impl TypeKey {
    /// Key for the native Rust type `T`.
    pub fn of<T: Any>() -> Self {
        Self(Repr::Native {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        })
    }

    /// Key for a caller-defined category.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self(Repr::Named(name.into()))
    }

    /// Human readable name.
    pub fn name(&self) -> &str {
        match &self.0 {
            Repr::Native { name, .. } => name,
            Repr::Named(name) => name,
        }
    }

    /// The `TypeId` backing this key, if it names a Rust type.
    pub fn type_id(&self) -> Option<TypeId> {
        match &self.0 {
            Repr::Native { id, .. } => Some(*id),
            Repr::Named(_) => None,
        }
    }

    /// Whether this key names a Rust type.
    pub fn is_native(&self) -> bool {
        matches!(self.0, Repr::Native { .. })
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Repr::Native { id: a, .. }, Repr::Native { id: b, .. }) => a == b,
            (Repr::Named(a), Repr::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            Repr::Native { id, .. } => {
                0u8.hash(state);
                id.hash(state);
            }
            Repr::Named(name) => {
                1u8.hash(state);
                name.hash(state);
            }
        }
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Native { name, .. } => write!(f, "TypeKey({})", name),
            Repr::Named(name) => write!(f, "TypeKey(named {:?})", name),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for TypeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A single variation tag, e.g. `"url"` or `"centimeters"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag(String);

impl Tag {
    /// Create a new tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Get the tag text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty tags are rejected at registration and reveal time.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Order-independent, de-duplicated set of tags.
///
/// Backed by a `BTreeSet` so iteration, hashing and serialization are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagSet(BTreeSet<Tag>);

impl TagSet {
    /// The empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set holding a single tag.
    pub fn single(tag: Tag) -> Self {
        let mut set = BTreeSet::new();
        set.insert(tag);
        Self(set)
    }

    /// Insert a tag, returning whether it was new.
    pub fn insert(&mut self, tag: Tag) -> bool {
        self.0.insert(tag)
    }

    /// Whether the tag is present.
    pub fn contains(&self, tag: &Tag) -> bool {
        self.0.contains(tag)
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every tag of `other` is in `self`.
    pub fn is_superset(&self, other: &TagSet) -> bool {
        self.0.is_superset(&other.0)
    }

    /// Whether every tag of `self` is in `other`.
    pub fn is_subset(&self, other: &TagSet) -> bool {
        self.0.is_subset(&other.0)
    }

    /// `(self - consumed) | produced`: the tags carried past an edge.
    pub fn carried(&self, consumed: &TagSet, produced: &TagSet) -> TagSet {
        Self(
            self.0
                .difference(&consumed.0)
                .chain(produced.0.iter())
                .cloned()
                .collect(),
        )
    }

    /// Iterate tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    /// First empty tag, if any.
    pub(crate) fn find_empty(&self) -> Option<&Tag> {
        self.0.iter().find(|t| t.is_empty())
    }
}

impl<T: Into<Tag>> FromIterator<T> for TagSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", tag)?;
        }
        f.write_str("}")
    }
}

/// A (type, tag-set) pair. Equality ignores tag order and duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VariationKey {
    /// The value category.
    pub type_key: TypeKey,
    /// Context tags refining the type.
    pub tags: TagSet,
}

impl VariationKey {
    /// Create a new variation key.
    pub fn new(type_key: TypeKey, tags: TagSet) -> Self {
        Self { type_key, tags }
    }

    /// Key for a bare type with no tags.
    pub fn bare(type_key: TypeKey) -> Self {
        Self::new(type_key, TagSet::new())
    }

    /// Effective start keys for a value of `type_key` carrying `tags`:
    /// the bare type, each single tag, and the full combination.
    pub fn start_keys(type_key: &TypeKey, tags: &TagSet) -> Vec<VariationKey> {
        let mut keys = vec![Self::bare(type_key.clone())];
        if tags.len() > 1 {
            keys.extend(
                tags.iter()
                    .map(|tag| Self::new(type_key.clone(), TagSet::single(tag.clone()))),
            );
        }
        if !tags.is_empty() {
            keys.push(Self::new(type_key.clone(), tags.clone()));
        }
        keys
    }
}

impl fmt::Display for VariationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tags.is_empty() {
            write!(f, "{}", self.type_key)
        } else {
            write!(f, "{}{}", self.type_key, self.tags)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_native_keys_compare_by_type() {
        assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
        assert_ne!(TypeKey::of::<String>(), TypeKey::of::<i64>());
        assert!(TypeKey::of::<u8>().is_native());
    }

    #[test]
    fn test_named_keys_never_equal_native() {
        let named = TypeKey::named(std::any::type_name::<String>());
        assert_ne!(named, TypeKey::of::<String>());
        assert_eq!(named, TypeKey::named(std::any::type_name::<String>()));
        assert!(named.type_id().is_none());
    }

    #[test]
    fn test_tagset_order_and_duplicates() {
        let a: TagSet = ["b", "a", "b"].into_iter().collect();
        let b: TagSet = ["a", "b"].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.to_string(), "{a, b}");

        let ka = VariationKey::new(TypeKey::named("T"), a);
        let kb = VariationKey::new(TypeKey::named("T"), b);
        let set: HashSet<_> = [ka, kb].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_carried_tags() {
        let have: TagSet = ["x", "y"].into_iter().collect();
        let consumed: TagSet = ["x"].into_iter().collect();
        let produced: TagSet = ["z"].into_iter().collect();
        let next = have.carried(&consumed, &produced);
        let expected: TagSet = ["y", "z"].into_iter().collect();
        assert_eq!(next, expected);
    }

    #[test]
    fn test_start_keys() {
        let ty = TypeKey::named("T");
        assert_eq!(VariationKey::start_keys(&ty, &TagSet::new()).len(), 1);

        let one: TagSet = ["x"].into_iter().collect();
        // Single tag: the single-tag key is also the combined key.
        assert_eq!(VariationKey::start_keys(&ty, &one).len(), 2);

        let two: TagSet = ["x", "y"].into_iter().collect();
        let keys = VariationKey::start_keys(&ty, &two);
        assert_eq!(keys.len(), 4);
        assert!(keys.contains(&VariationKey::bare(ty.clone())));
        assert!(keys.contains(&VariationKey::new(ty.clone(), two.clone())));
    }
}
