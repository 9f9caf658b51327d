//! Cost-ordered path search over the conversion graph.
//!
//! The search expands (type, carried tags) states from a set of start keys
//! using a priority queue, producing the cheapest chain of edges that ends on
//! an acceptable goal.

use std::collections::{BTreeSet, BinaryHeap, HashSet};
use std::sync::Arc;

use crate::policy::{FrontierEntry, RouteScore, SearchPolicy};
use crate::store::EdgeStore;
use crate::types::{ConversionEdge, Cost, EdgeId, EdgeSummary, TagSet, TypeKey, VariationKey};

/// Error type for search operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The configured expansion budget ran out before a goal was found.
    #[error("Search exceeded its budget of {limit} expansions")]
    BudgetExceeded {
        /// Configured budget.
        limit: usize,
    },
}

/// What to search for.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Keys the value may start from, all at distance 0.
    pub start_keys: Vec<VariationKey>,
    /// Requested type.
    pub target: TypeKey,
    /// Requested tags. `None` accepts any tags on the target type.
    pub target_tags: Option<TagSet>,
    /// Require at least one edge; no implicit identity.
    pub explicit: bool,
}

impl SearchRequest {
    /// Create a new search request.
    pub fn new(
        start_keys: Vec<VariationKey>,
        target: TypeKey,
        target_tags: Option<TagSet>,
        explicit: bool,
    ) -> Self {
        Self { start_keys, target, target_tags, explicit }
    }

    /// The start key with the most tags, used for diagnostics.
    pub fn richest_start(&self) -> VariationKey {
        self.start_keys
            .iter()
            .max_by_key(|k| k.tags.len())
            .cloned()
            .unwrap_or_else(|| VariationKey::bare(self.target.clone()))
    }
}

/// A chain of edges from a start key to a goal key.
#[derive(Debug, Clone)]
pub struct Path {
    /// Edges in execution order. Empty for an identity conversion.
    pub edges: Vec<Arc<ConversionEdge>>,
    /// Key the path starts from.
    pub start: VariationKey,
    /// Key the path ends on.
    pub goal: VariationKey,
    /// Total cost.
    pub cost: Cost,
}

impl Path {
    /// Whether the value already satisfied the request.
    pub fn is_identity(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the path has no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edge descriptors in execution order.
    pub fn summaries(&self) -> Vec<EdgeSummary> {
        self.edges.iter().map(|e| e.summary()).collect()
    }
}

/// A search state. `departed` separates start states from the same key
/// reached through edges, so explicit searches can revisit their start.
type StateKey = (VariationKey, bool);

/// A settled state and how it was reached.
struct Settled {
    key: VariationKey,
    parent: Option<usize>,
    edge: Option<Arc<ConversionEdge>>,
}

/// Frontier payload.
struct Candidate {
    key: VariationKey,
    departed: bool,
    parent: Option<usize>,
    edge: Option<Arc<ConversionEdge>>,
}

/// Uniform-cost path search.
///
/// ## Algorithm
///
/// 1. Seed the frontier with every start key at score zero
/// 2. Pop the best-ranked candidate; skip it if its state is already settled
/// 3. If it is a goal, rebuild the path through the parent links
/// 4. Otherwise push every applicable, non-excluded edge:
///    - the edge's source type matches and its source tags are carried
///    - the next state carries `(tags - source tags) | target tags`
/// 5. Return `None` when the frontier empties
///
/// Ranking is cost, then edge count, then tags consumed, then tags produced,
/// then push order.
pub struct PathSearch<'a, S: EdgeStore + ?Sized> {
    store: &'a S,
    policy: &'a SearchPolicy,
}

impl<'a, S: EdgeStore + ?Sized> PathSearch<'a, S> {
    /// Create a search over `store`.
    pub fn new(store: &'a S, policy: &'a SearchPolicy) -> Self {
        Self { store, policy }
    }

    /// Find the best path, skipping `excluded` edges.
    pub fn find_path(
        &self,
        request: &SearchRequest,
        excluded: &BTreeSet<EdgeId>,
    ) -> Result<Option<Path>, SearchError> {
        let mut settled: HashSet<StateKey> = HashSet::new();
        let mut states: Vec<Settled> = Vec::new();
        let mut frontier: BinaryHeap<FrontierEntry<Candidate>> = BinaryHeap::new();
        let mut seq: u64 = 0;

        for key in &request.start_keys {
            frontier.push(FrontierEntry {
                score: RouteScore::default(),
                seq,
                item: Candidate {
                    key: key.clone(),
                    departed: !request.explicit,
                    parent: None,
                    edge: None,
                },
            });
            seq += 1;
        }

        while let Some(FrontierEntry { score, item, .. }) = frontier.pop() {
            if !settled.insert((item.key.clone(), item.departed)) {
                continue;
            }

            if let Some(limit) = self.policy.max_expansions {
                if states.len() >= limit {
                    tracing::debug!(limit, "search budget exhausted");
                    return Err(SearchError::BudgetExceeded { limit });
                }
            }

            let index = states.len();
            let is_goal = item.departed && self.is_goal(&item.key, request);
            states.push(Settled {
                key: item.key,
                parent: item.parent,
                edge: item.edge,
            });

            if is_goal {
                let path = rebuild(&states, index, score.cost);
                tracing::debug!(
                    start = %path.start,
                    goal = %path.goal,
                    cost = path.cost,
                    edges = path.len(),
                    settled = states.len(),
                    "path found"
                );
                return Ok(Some(path));
            }

            let current = &states[index].key;
            for edge in self.store.edges_from_type(&current.type_key) {
                if excluded.contains(&edge.id) || !edge.source.tags.is_subset(&current.tags) {
                    continue;
                }

                let next = VariationKey::new(
                    edge.target.type_key.clone(),
                    current.tags.carried(&edge.source.tags, &edge.target.tags),
                );
                if settled.contains(&(next.clone(), true)) {
                    continue;
                }

                tracing::trace!(edge = %edge, next = %next, "expand");
                frontier.push(FrontierEntry {
                    score: score.extend(edge),
                    seq,
                    item: Candidate {
                        key: next,
                        departed: true,
                        parent: Some(index),
                        edge: Some(Arc::clone(edge)),
                    },
                });
                seq += 1;
            }
        }

        tracing::debug!(
            target_type = %request.target,
            settled = states.len(),
            edges = self.store.num_edges(),
            "no path"
        );
        Ok(None)
    }

    fn is_goal(&self, key: &VariationKey, request: &SearchRequest) -> bool {
        key.type_key == request.target
            && self
                .policy
                .match_policy
                .accepts(&key.tags, request.target_tags.as_ref())
    }
}

/// Follow parent links from `index` back to a start state.
fn rebuild(states: &[Settled], index: usize, cost: Cost) -> Path {
    let goal = states[index].key.clone();
    let mut edges = Vec::new();
    let mut cursor = index;
    loop {
        let state = &states[cursor];
        if let Some(edge) = &state.edge {
            edges.push(Arc::clone(edge));
        }
        match state.parent {
            Some(parent) => cursor = parent,
            None => break,
        }
    }
    edges.reverse();

    Path {
        edges,
        start: states[cursor].key.clone(),
        goal,
        cost,
    }
}
