//! Registry storage: conversion edges and revealers.

pub mod edges;
pub mod revealers;

use std::sync::Arc;
use crate::types::{ConversionEdge, TypeKey};

/// Read access to conversion edges, as needed by the path search.
///
/// Implementations must return edges in a stable order (registration order
/// for the in-memory table) so searches are deterministic.
pub trait EdgeStore {
    /// Every edge whose source type is `type_key`, regardless of tags.
    fn edges_from_type(&self, type_key: &TypeKey) -> &[Arc<ConversionEdge>];

    /// Total number of edges.
    fn num_edges(&self) -> usize;
}

pub use edges::EdgeTable;
pub use revealers::{Revealer, RevealerTable, run_revealers};
