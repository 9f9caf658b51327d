//! Error types surfaced by registration and conversion.

use serde::Serialize;
use std::fmt;

use super::edge::{EdgeId, EdgeSummary};
use super::key::{TagSet, TypeKey, VariationKey};

/// Invalid registration. Raised immediately by `add_conversion`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// Costs must be non-negative.
    #[error("Conversion cost must be >= 0, got {0}")]
    NegativeCost(i64),
    /// Tags must be non-empty strings.
    #[error("Empty variation tag in conversion {source_type} -> {target_type}")]
    EmptyTag {
        /// Source type of the rejected conversion.
        source_type: String,
        /// Target type of the rejected conversion.
        target_type: String,
    },
}

/// A revealer failed while inspecting a value.
#[derive(Debug, thiserror::Error)]
pub enum RevealerError {
    /// The revealer function itself returned an error.
    #[error("Revealer for {type_key} failed: {message}")]
    Failed {
        /// Type the revealer is registered for.
        type_key: TypeKey,
        /// Error text from the revealer.
        message: String,
    },
    /// The revealer produced an empty tag.
    #[error("Revealer for {0} produced an empty tag")]
    EmptyTag(TypeKey),
}

/// One failed step of an executed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    /// The edge that failed.
    pub edge: EdgeSummary,
    /// Position of the edge within the attempted path.
    pub step: usize,
    /// Why the step failed.
    pub reason: String,
}

impl StepFailure {
    /// Identity of the failed edge.
    pub fn edge_id(&self) -> EdgeId {
        self.edge.id
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.edge, self.edge.id, self.reason)
    }
}

/// Terminal failure of a `convert` call.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// No registered route connects the value to the request.
    #[error("Could not convert {from} to {}. Perhaps some conversion steps are missing.", display_goal(.to, .want))]
    NoPath {
        /// Richest start key of the value.
        from: VariationKey,
        /// Requested type.
        to: TypeKey,
        /// Requested tags, if any.
        want: Option<TagSet>,
    },
    /// Routes existed but every one of them failed at runtime.
    #[error("Some problems occurred during the conversion process:\n{}", display_failures(.failures))]
    Exhausted {
        /// Richest start key of the value.
        from: VariationKey,
        /// Requested type.
        to: TypeKey,
        /// Every step failure, in the order encountered.
        failures: Vec<StepFailure>,
    },
    /// The search gave up after settling too many states.
    #[error("Search from {from} to {to} exceeded its budget of {limit} expansions")]
    BudgetExceeded {
        /// Richest start key of the value.
        from: VariationKey,
        /// Requested type.
        to: TypeKey,
        /// Configured expansion budget.
        limit: usize,
        /// Step failures seen before giving up.
        failures: Vec<StepFailure>,
    },
    /// A declared `type_have` does not describe the value.
    #[error("Value of type {actual} cannot be treated as {declared}")]
    TypeMismatch {
        /// The declared type.
        declared: TypeKey,
        /// The value's own type.
        actual: TypeKey,
    },
    /// A revealer failed; revealers are expected never to fail.
    #[error(transparent)]
    Revealer(#[from] RevealerError),
}

impl ConversionError {
    /// Step failures recorded before the conversion gave up.
    pub fn failures(&self) -> &[StepFailure] {
        match self {
            Self::Exhausted { failures, .. } | Self::BudgetExceeded { failures, .. } => failures,
            _ => &[],
        }
    }

    /// Whether no route existed at all.
    pub fn is_no_path(&self) -> bool {
        matches!(self, Self::NoPath { .. })
    }
}

fn display_goal(to: &TypeKey, want: &Option<TagSet>) -> String {
    match want {
        Some(tags) if !tags.is_empty() => format!("{}{}", to, tags),
        _ => to.to_string(),
    }
}

fn display_failures(failures: &[StepFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_path_message() {
        let err = ConversionError::NoPath {
            from: VariationKey::bare(TypeKey::named("A")),
            to: TypeKey::named("B"),
            want: Some(["x"].into_iter().collect()),
        };
        assert_eq!(
            err.to_string(),
            "Could not convert A to B{x}. Perhaps some conversion steps are missing."
        );
        assert!(err.is_no_path());
        assert!(err.failures().is_empty());
    }

    #[test]
    fn test_exhausted_lists_failures() {
        let edge = EdgeSummary {
            id: EdgeId(3),
            cost: 1,
            source: VariationKey::bare(TypeKey::named("F")),
            target: VariationKey::bare(TypeKey::named("G")),
        };
        let err = ConversionError::Exhausted {
            from: VariationKey::bare(TypeKey::named("F")),
            to: TypeKey::named("G"),
            failures: vec![StepFailure { edge, step: 0, reason: "BAD STUFF".into() }],
        };
        assert_eq!(
            err.to_string(),
            "Some problems occurred during the conversion process:\nF -> G (#3): BAD STUFF"
        );
        assert_eq!(err.failures().len(), 1);
    }
}
