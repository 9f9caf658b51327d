//! Revealers: functions that derive extra variation tags from a value.

use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{BoxError, RevealerError, Tag, TagSet, TypeKey, Value};

/// Inspects a value and reports the variation tags it satisfies.
///
/// Revealers run once per `convert` call, on the supplied value only, never
/// on intermediate results. They should be quick checks (attribute tests,
/// prefix matches) and must return a finite list.
pub trait Revealer: Send + Sync {
    /// Tags satisfied by `value`. An empty list means "nothing extra".
    fn reveal(&self, value: &Value) -> Result<Vec<Tag>, BoxError>;
}

impl<F> Revealer for F
where
    F: Fn(&Value) -> Result<Vec<Tag>, BoxError> + Send + Sync,
{
    fn reveal(&self, value: &Value) -> Result<Vec<Tag>, BoxError> {
        self(value)
    }
}

/// Revealers keyed by the type they inspect.
#[derive(Default)]
pub struct RevealerTable {
    revealers: HashMap<TypeKey, Vec<Arc<dyn Revealer>>>,
}

impl RevealerTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a revealer for `type_key`.
    pub fn register(&mut self, type_key: TypeKey, revealer: Arc<dyn Revealer>) {
        self.revealers.entry(type_key).or_default().push(revealer);
    }

    /// Revealers registered for `type_key`, in registration order.
    pub fn revealers_for(&self, type_key: &TypeKey) -> Vec<Arc<dyn Revealer>> {
        self.revealers.get(type_key).cloned().unwrap_or_default()
    }

    /// Run every revealer for `type_key` against `value` and union the tags.
    pub fn reveal(&self, type_key: &TypeKey, value: &Value) -> Result<TagSet, RevealerError> {
        run_revealers(type_key, &self.revealers_for(type_key), value)
    }
}

/// Run `revealers` against `value`, unioning their tags.
///
/// Split from [`RevealerTable::reveal`] so callers can release the registry
/// lock before running user code.
pub fn run_revealers(
    type_key: &TypeKey,
    revealers: &[Arc<dyn Revealer>],
    value: &Value,
) -> Result<TagSet, RevealerError> {
    let mut tags = TagSet::new();
    for revealer in revealers {
        let revealed = revealer.reveal(value).map_err(|e| RevealerError::Failed {
            type_key: type_key.clone(),
            message: e.to_string(),
        })?;
        for tag in revealed {
            if tag.is_empty() {
                return Err(RevealerError::EmptyTag(type_key.clone()));
            }
            tags.insert(tag);
        }
    }
    Ok(tags)
}
