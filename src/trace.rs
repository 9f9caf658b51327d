//! Diagnostic record of a conversion: every route tried and how it ended.

use serde::Serialize;

use crate::policy::SearchPolicy;
use crate::search::Path;
use crate::types::{Cost, EdgeSummary, StepFailure, TagSet, TypeKey, VariationKey};

/// How an attempted route ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Every step succeeded.
    Succeeded,
    /// A step failed; its edge was excluded before the next search.
    Failed {
        /// The failing step.
        failure: StepFailure,
    },
}

/// One route chosen by the search and executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    /// Edges in execution order.
    pub route: Vec<EdgeSummary>,
    /// Total route cost.
    pub cost: Cost,
    /// Result of executing the route.
    pub outcome: AttemptOutcome,
}

/// Trace of a single `convert` call.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionTrace {
    /// Requested type.
    pub target: TypeKey,
    /// Requested tags.
    pub target_tags: Option<TagSet>,
    /// Start keys seeded into the search.
    pub start_keys: Vec<VariationKey>,
    /// Tags contributed by revealers.
    pub revealed: TagSet,
    /// Routes tried, in order.
    pub attempts: Vec<Attempt>,
    /// Version of the search policy in effect.
    pub policy_id: String,
    /// Hash of the search policy in effect.
    pub policy_hash: String,
    /// Fingerprint of the registry the search ran against.
    pub registry_fingerprint: String,
}

impl ConversionTrace {
    /// Create an empty trace for a request.
    pub fn new(
        target: TypeKey,
        target_tags: Option<TagSet>,
        policy: &SearchPolicy,
        registry_fingerprint: String,
    ) -> Self {
        Self {
            target,
            target_tags,
            start_keys: Vec::new(),
            revealed: TagSet::new(),
            attempts: Vec::new(),
            policy_id: policy.policy_id().to_string(),
            policy_hash: policy.params_hash(),
            registry_fingerprint,
        }
    }

    pub(crate) fn record(&mut self, path: &Path, outcome: AttemptOutcome) {
        self.attempts.push(Attempt {
            route: path.summaries(),
            cost: path.cost,
            outcome,
        });
    }

    /// The route that succeeded, if any.
    pub fn succeeded(&self) -> Option<&Attempt> {
        self.attempts
            .iter()
            .find(|a| a.outcome == AttemptOutcome::Succeeded)
    }

    /// Pretty JSON rendering for logs and bug reports.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
