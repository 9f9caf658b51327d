//! Route ranking for the search frontier.

use std::cmp::Ordering;

use crate::types::{ConversionEdge, Cost};

/// Accumulated score of a partial route.
///
/// Routes rank by:
/// 1. lower total cost
/// 2. fewer edges
/// 3. more tags consumed (the more specific route)
/// 4. more tags produced (the tag-richer result)
///
/// Every edge adds one hop, so extending a route always makes it rank
/// strictly worse. The search relies on this to settle states in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteScore {
    /// Sum of edge costs.
    pub cost: Cost,
    /// Number of edges.
    pub hops: u32,
    /// Number of tag dependencies satisfied along the route.
    pub consumed: u32,
    /// Number of tags produced along the route.
    pub added: u32,
}

impl RouteScore {
    /// Score after traversing `edge`.
    pub fn extend(&self, edge: &ConversionEdge) -> Self {
        Self {
            cost: self.cost.saturating_add(edge.cost),
            hops: self.hops + 1,
            consumed: self.consumed + edge.source.tags.len() as u32,
            added: self.added + edge.target.tags.len() as u32,
        }
    }
}

impl PartialOrd for RouteScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Less = better.
impl Ord for RouteScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.hops.cmp(&other.hops))
            .then_with(|| other.consumed.cmp(&self.consumed))
            .then_with(|| other.added.cmp(&self.added))
    }
}

/// Frontier entry for a max-heap: the best-ranked entry pops first.
#[derive(Debug)]
pub struct FrontierEntry<T> {
    /// Route score so far.
    pub score: RouteScore,
    /// Push order, the final tie-break.
    pub seq: u64,
    /// Payload.
    pub item: T,
}

impl<T> PartialEq for FrontierEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.seq == other.seq
    }
}

impl<T> Eq for FrontierEntry<T> {}

impl<T> PartialOrd for FrontierEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for FrontierEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    fn score(cost: Cost, hops: u32, consumed: u32) -> RouteScore {
        RouteScore { cost, hops, consumed, added: 0 }
    }

    #[test]
    fn test_cost_dominates() {
        assert!(score(1, 5, 0) < score(2, 1, 3));
    }

    #[test]
    fn test_hops_break_cost_ties() {
        assert!(score(2, 1, 0) < score(2, 2, 0));
    }

    #[test]
    fn test_consumed_breaks_hop_ties() {
        assert!(score(2, 2, 1) < score(2, 2, 0));
    }

    #[test]
    fn test_added_breaks_consumed_ties() {
        let plain = score(2, 2, 1);
        let tagged = RouteScore { added: 2, ..plain };
        assert!(tagged < plain);
        assert!(score(2, 2, 1) < RouteScore { added: 5, ..score(2, 2, 0) });
    }

    #[test]
    fn test_frontier_pops_best_then_oldest() {
        let mut heap = BinaryHeap::new();
        heap.push(FrontierEntry { score: score(3, 1, 0), seq: 0, item: "expensive" });
        heap.push(FrontierEntry { score: score(1, 1, 0), seq: 2, item: "late" });
        heap.push(FrontierEntry { score: score(1, 1, 0), seq: 1, item: "early" });

        assert_eq!(heap.pop().unwrap().item, "early");
        assert_eq!(heap.pop().unwrap().item, "late");
        assert_eq!(heap.pop().unwrap().item, "expensive");
    }
}
