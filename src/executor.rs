//! Path execution with failure-driven re-search.
//!
//! A route that type-checks structurally can still fail on a particular
//! value (parsing `"not a number"` as an integer, say). When a step fails the
//! executor excludes that edge and asks the search for the next best route
//! from the original start keys, until a route succeeds or none remain.

use std::collections::BTreeSet;

use crate::policy::SearchPolicy;
use crate::search::{Path, SearchError, SearchRequest};
use crate::trace::{AttemptOutcome, ConversionTrace};
use crate::types::{ConversionError, EdgeId, StepFailure, Value};

/// Result of a successful execution.
#[derive(Debug)]
pub enum Outcome {
    /// The input already satisfied the request; no edge ran.
    Identity,
    /// The converted value.
    Converted(Value),
}

/// Runs found paths against a value.
pub struct Executor<'a> {
    policy: &'a SearchPolicy,
    debug: bool,
}

impl<'a> Executor<'a> {
    /// Create an executor. With `debug` every step is logged at warn level.
    pub fn new(policy: &'a SearchPolicy, debug: bool) -> Self {
        Self { policy, debug }
    }

    /// Convert `value`, searching with `find` until a route succeeds.
    ///
    /// `find` receives the set of edges excluded so far. Every attempt runs
    /// on the original `value`.
    pub fn run<F>(
        &self,
        value: &Value,
        request: &SearchRequest,
        mut find: F,
        mut trace: Option<&mut ConversionTrace>,
    ) -> Result<Outcome, ConversionError>
    where
        F: FnMut(&BTreeSet<EdgeId>) -> Result<Option<Path>, SearchError>,
    {
        let mut excluded: BTreeSet<EdgeId> = BTreeSet::new();
        let mut failures: Vec<StepFailure> = Vec::new();
        let mut attempts = 0usize;

        loop {
            // The first route always runs; the cap bounds retries.
            if let Some(max) = self.policy.max_attempts {
                if attempts >= max.max(1) {
                    tracing::debug!(attempts, "attempt limit reached");
                    break;
                }
            }

            let path = match find(&excluded) {
                Ok(Some(path)) => path,
                Ok(None) => break,
                Err(SearchError::BudgetExceeded { limit }) => {
                    return Err(ConversionError::BudgetExceeded {
                        from: request.richest_start(),
                        to: request.target.clone(),
                        limit,
                        failures,
                    });
                }
            };
            attempts += 1;

            match self.apply(&path, value) {
                Ok(result) => {
                    if let Some(trace) = trace.as_deref_mut() {
                        trace.record(&path, AttemptOutcome::Succeeded);
                    }
                    return Ok(match result {
                        Some(converted) => Outcome::Converted(converted),
                        None => Outcome::Identity,
                    });
                }
                Err(failure) => {
                    tracing::warn!(
                        edge = %failure.edge,
                        step = failure.step,
                        reason = %failure.reason,
                        "conversion step failed, searching for another route"
                    );
                    if let Some(trace) = trace.as_deref_mut() {
                        trace.record(&path, AttemptOutcome::Failed { failure: failure.clone() });
                    }
                    excluded.insert(failure.edge_id());
                    failures.push(failure);
                }
            }
        }

        let from = request.richest_start();
        let to = request.target.clone();
        if failures.is_empty() {
            Err(ConversionError::NoPath {
                from,
                to,
                want: request.target_tags.clone(),
            })
        } else {
            Err(ConversionError::Exhausted { from, to, failures })
        }
    }

    /// Apply every edge of `path` in order. `None` means the path was empty.
    fn apply(&self, path: &Path, value: &Value) -> Result<Option<Value>, StepFailure> {
        let mut current: Option<Value> = None;

        for (step, edge) in path.edges.iter().enumerate() {
            let input = current.as_ref().unwrap_or(value);
            if self.debug {
                tracing::warn!("{}({}) -> ...", edge, input);
            } else {
                tracing::trace!(edge = %edge, step, "apply");
            }

            let output = edge.apply(input).map_err(|e| StepFailure {
                edge: edge.summary(),
                step,
                reason: e.to_string(),
            })?;

            if !output.fits(&edge.target.type_key) {
                return Err(StepFailure {
                    edge: edge.summary(),
                    step,
                    reason: format!(
                        "returned {} where {} was expected",
                        output.type_key(),
                        edge.target.type_key
                    ),
                });
            }
            if self.debug {
                tracing::warn!("... -> {}", output);
            }
            current = Some(output.relabel(edge.target.type_key.clone()));
        }

        Ok(current)
    }
}
