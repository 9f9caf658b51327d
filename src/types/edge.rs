//! Conversion edges of the graph.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use super::key::VariationKey;
use super::value::Value;

/// Boxed error returned by conversion functions and revealers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Cost of traversing an edge. Lower is preferred.
pub type Cost = u64;

/// Stable identity of a registered edge: its registration index.
///
/// Ordering follows registration order, which the search uses as its final
/// tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EdgeId(pub(crate) usize);

impl EdgeId {
    /// Registration index.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single conversion step.
///
/// Implementations must be pure with respect to the conversion: the engine
/// may call a function, discard its result and try another route.
pub trait Conversion: Send + Sync {
    /// Convert `value` or explain why it cannot be converted.
    fn apply(&self, value: &Value) -> Result<Value, BoxError>;
}

impl<F> Conversion for F
where
    F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync,
{
    fn apply(&self, value: &Value) -> Result<Value, BoxError> {
        self(value)
    }
}

/// A registered, costed, directed conversion between two variation keys.
pub struct ConversionEdge {
    /// Registration identity.
    pub id: EdgeId,
    /// Traversal cost.
    pub cost: Cost,
    /// Type and tags required on input. The tags are dependencies.
    pub source: VariationKey,
    /// Type and tags produced on output.
    pub target: VariationKey,
    function: Arc<dyn Conversion>,
}

impl ConversionEdge {
    pub(crate) fn new(
        id: EdgeId,
        cost: Cost,
        source: VariationKey,
        target: VariationKey,
        function: Arc<dyn Conversion>,
    ) -> Self {
        Self { id, cost, source, target, function }
    }

    /// Run the edge's function.
    pub fn apply(&self, value: &Value) -> Result<Value, BoxError> {
        self.function.apply(value)
    }

    /// Serializable description, without the function.
    pub fn summary(&self) -> EdgeSummary {
        EdgeSummary {
            id: self.id,
            cost: self.cost,
            source: self.source.clone(),
            target: self.target.clone(),
        }
    }
}

impl fmt::Debug for ConversionEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionEdge")
            .field("id", &self.id)
            .field("cost", &self.cost)
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}

impl fmt::Display for ConversionEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Edge descriptor used in traces and registry fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeSummary {
    /// Registration identity.
    pub id: EdgeId,
    /// Traversal cost.
    pub cost: Cost,
    /// Source key.
    pub source: VariationKey,
    /// Target key.
    pub target: VariationKey,
}

impl fmt::Display for EdgeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}
