//! In-memory edge table.

use std::collections::HashMap;
use std::sync::Arc;

use crate::canonical::canonical_hash_hex;
use crate::types::{
    Conversion, ConversionEdge, Cost, EdgeId, EdgeSummary, RegistrationError, VariationKey, TypeKey,
};
use super::EdgeStore;

/// Registered conversions, grouped by source type.
///
/// Edges are never removed. Per-type lists keep registration order so
/// searches are deterministic.
#[derive(Default)]
pub struct EdgeTable {
    /// All edges, indexed by `EdgeId`.
    edges: Vec<Arc<ConversionEdge>>,
    /// Source type -> edges leaving it.
    by_type: HashMap<TypeKey, Vec<Arc<ConversionEdge>>>,
}

impl EdgeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conversion between two variation keys.
    pub fn register(
        &mut self,
        cost: i64,
        source: VariationKey,
        target: VariationKey,
        function: Arc<dyn Conversion>,
    ) -> Result<EdgeId, RegistrationError> {
        if cost < 0 {
            return Err(RegistrationError::NegativeCost(cost));
        }
        if source.tags.find_empty().is_some() || target.tags.find_empty().is_some() {
            return Err(RegistrationError::EmptyTag {
                source_type: source.type_key.to_string(),
                target_type: target.type_key.to_string(),
            });
        }

        let id = EdgeId(self.edges.len());
        let edge = Arc::new(ConversionEdge::new(id, cost as Cost, source, target, function));
        self.by_type
            .entry(edge.source.type_key.clone())
            .or_default()
            .push(Arc::clone(&edge));
        self.edges.push(edge);
        Ok(id)
    }

    /// Edges whose source is exactly `key`.
    pub fn edges_from(&self, key: &VariationKey) -> Vec<Arc<ConversionEdge>> {
        self.edges_from_type(&key.type_key)
            .iter()
            .filter(|e| e.source.tags == key.tags)
            .cloned()
            .collect()
    }

    /// Number of registered edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Descriptors of every edge in registration order.
    pub fn summaries(&self) -> Vec<EdgeSummary> {
        self.edges.iter().map(|e| e.summary()).collect()
    }

    /// Deterministic hash of the registered edge descriptors.
    ///
    /// Functions are not part of the hash; two tables with the same shape
    /// fingerprint identically.
    pub fn fingerprint(&self) -> String {
        canonical_hash_hex(&self.summaries())
    }
}

impl EdgeStore for EdgeTable {
    fn edges_from_type(&self, type_key: &TypeKey) -> &[Arc<ConversionEdge>] {
        self.by_type.get(type_key).map(Vec::as_slice).unwrap_or(&[])
    }

    fn num_edges(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoxError, TagSet, Value};

    fn noop() -> Arc<dyn Conversion> {
        Arc::new(|v: &Value| -> Result<Value, BoxError> {
            Ok(Value::new(v.to_string()))
        })
    }

    fn key(name: &str, tags: &[&str]) -> VariationKey {
        VariationKey::new(TypeKey::named(name), tags.iter().copied().collect())
    }

    #[test]
    fn test_register_and_lookup() {
        let mut table = EdgeTable::new();
        let a = table.register(1, key("A", &[]), key("B", &[]), noop()).unwrap();
        let b = table.register(2, key("A", &["v"]), key("C", &[]), noop()).unwrap();
        table.register(1, key("B", &[]), key("C", &[]), noop()).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);

        assert_eq!(table.edges_from_type(&TypeKey::named("A")).len(), 2);
        assert_eq!(table.edges_from(&key("A", &[])).len(), 1);
        assert_eq!(table.edges_from(&key("A", &["v"]))[0].id, b);
        assert!(table.edges_from_type(&TypeKey::named("Z")).is_empty());
        assert_eq!(table.edges_from(&key("A", &["v"]))[0].cost, 2);
        assert_eq!(table.num_edges(), 3);
    }

    #[test]
    fn test_negative_cost_rejected() {
        let mut table = EdgeTable::new();
        let err = table.register(-1, key("A", &[]), key("B", &[]), noop()).unwrap_err();
        assert_eq!(err, RegistrationError::NegativeCost(-1));
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_tag_rejected() {
        let mut table = EdgeTable::new();
        let source = VariationKey::new(TypeKey::named("A"), TagSet::single("".into()));
        let err = table.register(0, source, key("B", &[]), noop()).unwrap_err();
        assert!(matches!(err, RegistrationError::EmptyTag { .. }));
    }

    #[test]
    fn test_fingerprint_tracks_shape() {
        let mut t1 = EdgeTable::new();
        let mut t2 = EdgeTable::new();
        assert_eq!(t1.fingerprint(), t2.fingerprint());

        t1.register(1, key("A", &[]), key("B", &[]), noop()).unwrap();
        assert_ne!(t1.fingerprint(), t2.fingerprint());

        t2.register(1, key("A", &[]), key("B", &[]), noop()).unwrap();
        assert_eq!(t1.fingerprint(), t2.fingerprint());
    }
}
