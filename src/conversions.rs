//! The conversions registry: registration plus `convert`.

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::executor::{Executor, Outcome};
use crate::policy::SearchPolicy;
use crate::search::{PathSearch, SearchRequest};
use crate::store::{run_revealers, EdgeTable, Revealer, RevealerTable};
use crate::trace::ConversionTrace;
use crate::types::{
    BoxError, Conversion, ConversionError, EdgeId, RegistrationError, Tag, TagSet, TypeKey,
    Value, VariationKey,
};

/// A conversion request: what to produce and how to read the input.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    /// Requested type.
    pub type_want: TypeKey,
    /// Requested tags. `None` accepts the target type with any tags.
    pub variations_want: Option<TagSet>,
    /// Override for the input type. Defaults to the value's label.
    pub type_have: Option<TypeKey>,
    /// Tags known to hold for the input.
    pub variations_have: TagSet,
    /// Require at least one registered edge, even if the input already
    /// satisfies the request.
    pub explicit: bool,
    /// Run revealers on the input.
    pub detect: bool,
    /// Log every executed step at warn level.
    pub debug: bool,
}

impl ConvertRequest {
    /// Request a conversion to `type_want`.
    pub fn new(type_want: TypeKey) -> Self {
        Self {
            type_want,
            variations_want: None,
            type_have: None,
            variations_have: TagSet::new(),
            explicit: false,
            detect: true,
            debug: false,
        }
    }

    /// Request a conversion to the Rust type `T`.
    pub fn to<T: Any>() -> Self {
        Self::new(TypeKey::of::<T>())
    }

    /// Require the result to carry these tags.
    pub fn want<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.variations_want = Some(tags.into_iter().collect());
        self
    }

    /// Treat the input as `type_have` instead of its own label.
    pub fn have(mut self, type_have: TypeKey) -> Self {
        self.type_have = Some(type_have);
        self
    }

    /// Declare tags that hold for the input.
    pub fn have_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.variations_have = tags.into_iter().collect();
        self
    }

    /// Set the explicit flag.
    pub fn explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    /// Enable or disable revealers.
    pub fn detect(mut self, detect: bool) -> Self {
        self.detect = detect;
        self
    }

    /// Enable or disable per-step debug logging.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

#[derive(Default)]
struct Registry {
    edges: EdgeTable,
    revealers: RevealerTable,
}

/// Registry of conversions and revealers.
///
/// Registration takes a write lock; conversions take short read locks for
/// each search and never hold the lock while user functions run, so a
/// conversion function may itself call [`Conversions::convert`].
///
/// # Example
///
/// ```rust
/// use conversion_graph::{Conversions, ConvertRequest, Value};
///
/// let conv = Conversions::new();
/// conv.add_typed_conversion(1, [] as [&str; 0], [] as [&str; 0], |s: &String| s.trim().parse::<i64>())
///     .unwrap();
///
/// let n: i64 = conv.convert_to(Value::new(String::from(" 42 "))).unwrap();
/// assert_eq!(n, 42);
/// ```
pub struct Conversions {
    registry: RwLock<Registry>,
    policy: SearchPolicy,
}

impl Conversions {
    /// Create an empty registry with the default policy.
    pub fn new() -> Self {
        Self::with_policy(SearchPolicy::default())
    }

    /// Create an empty registry with a custom policy.
    pub fn with_policy(policy: SearchPolicy) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            policy,
        }
    }

    /// Get the policy.
    pub fn policy(&self) -> &SearchPolicy {
        &self.policy
    }

    /// Register a conversion step.
    ///
    /// `variations_in` are dependencies: the edge is only usable when the
    /// value carries all of them, and traversing it consumes them.
    /// `variations_out` are added to the value's tags and may satisfy
    /// dependencies further down the chain.
    ///
    /// The function should perform one small conversion and return an error
    /// for anything it cannot handle; the engine will route around it.
    pub fn add_conversion<I, J, T, U, F>(
        &self,
        cost: i64,
        type_in: TypeKey,
        variations_in: I,
        type_out: TypeKey,
        variations_out: J,
        function: F,
    ) -> Result<EdgeId, RegistrationError>
    where
        I: IntoIterator<Item = T>,
        J: IntoIterator<Item = U>,
        T: Into<Tag>,
        U: Into<Tag>,
        F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.add_edge(
            cost,
            VariationKey::new(type_in, variations_in.into_iter().collect()),
            VariationKey::new(type_out, variations_out.into_iter().collect()),
            Arc::new(function),
        )
    }

    /// Register a conversion between two Rust types.
    ///
    /// The input is downcast to `A` and the output wrapped from `B`.
    pub fn add_typed_conversion<A, B, E, I, J, T, U, F>(
        &self,
        cost: i64,
        variations_in: I,
        variations_out: J,
        function: F,
    ) -> Result<EdgeId, RegistrationError>
    where
        A: Any,
        B: Any + Send,
        E: Into<BoxError>,
        I: IntoIterator<Item = T>,
        J: IntoIterator<Item = U>,
        T: Into<Tag>,
        U: Into<Tag>,
        F: Fn(&A) -> Result<B, E> + Send + Sync + 'static,
    {
        self.add_conversion(
            cost,
            TypeKey::of::<A>(),
            variations_in,
            TypeKey::of::<B>(),
            variations_out,
            move |value: &Value| -> Result<Value, BoxError> {
                let input = value.downcast_ref::<A>().ok_or_else(|| {
                    BoxError::from(format!(
                        "expected {}, got {}",
                        std::any::type_name::<A>(),
                        value.type_key()
                    ))
                })?;
                function(input).map(Value::new).map_err(Into::into)
            },
        )
    }

    /// Register a conversion given as a trait object.
    pub fn add_edge(
        &self,
        cost: i64,
        source: VariationKey,
        target: VariationKey,
        function: Arc<dyn Conversion>,
    ) -> Result<EdgeId, RegistrationError> {
        let id = self.registry.write().edges.register(cost, source, target, function)?;
        tracing::debug!(edge = %id, cost, "conversion registered");
        Ok(id)
    }

    /// Register a revealer for values of `type_in`.
    ///
    /// Revealers only run on the value passed to `convert`, not on
    /// intermediate results.
    pub fn add_revealer<F>(&self, type_in: TypeKey, function: F)
    where
        F: Fn(&Value) -> Result<Vec<Tag>, BoxError> + Send + Sync + 'static,
    {
        self.add_revealer_arc(type_in, Arc::new(function));
    }

    /// Register a revealer given as a trait object.
    pub fn add_revealer_arc(&self, type_in: TypeKey, revealer: Arc<dyn Revealer>) {
        tracing::debug!(type_key = %type_in, "revealer registered");
        self.registry.write().revealers.register(type_in, revealer);
    }

    /// Register a revealer for the Rust type `T`.
    pub fn add_typed_revealer<T, I, F>(&self, function: F)
    where
        T: Any,
        I: IntoIterator,
        I::Item: Into<Tag>,
        F: Fn(&T) -> I + Send + Sync + 'static,
    {
        self.add_revealer(TypeKey::of::<T>(), move |value: &Value| -> Result<Vec<Tag>, BoxError> {
            let input = value.downcast_ref::<T>().ok_or_else(|| {
                BoxError::from(format!("value is not a {}", std::any::type_name::<T>()))
            })?;
            Ok(function(input).into_iter().map(Into::into).collect())
        });
    }

    /// Convert `value` as described by `request`.
    pub fn convert(&self, value: Value, request: &ConvertRequest) -> Result<Value, ConversionError> {
        self.run(value, request, None)
    }

    /// Convert `value` to the Rust type `T`.
    pub fn convert_to<T: Any>(&self, value: Value) -> Result<T, ConversionError> {
        self.convert(value, &ConvertRequest::to::<T>())?
            .downcast::<T>()
            .map_err(|v| ConversionError::TypeMismatch {
                declared: TypeKey::of::<T>(),
                actual: v.type_key().clone(),
            })
    }

    /// Convert and return a trace of every route tried.
    pub fn convert_traced(
        &self,
        value: Value,
        request: &ConvertRequest,
    ) -> (Result<Value, ConversionError>, ConversionTrace) {
        let mut trace = ConversionTrace::new(
            request.type_want.clone(),
            request.variations_want.clone(),
            &self.policy,
            self.fingerprint(),
        );
        let result = self.run(value, request, Some(&mut trace));
        (result, trace)
    }

    /// Number of registered edges.
    pub fn num_edges(&self) -> usize {
        self.registry.read().edges.len()
    }

    /// Deterministic hash of the registered edges.
    pub fn fingerprint(&self) -> String {
        self.registry.read().edges.fingerprint()
    }

    fn run(
        &self,
        value: Value,
        request: &ConvertRequest,
        mut trace: Option<&mut ConversionTrace>,
    ) -> Result<Value, ConversionError> {
        let source = request
            .type_have
            .clone()
            .unwrap_or_else(|| value.type_key().clone());
        if !value.fits(&source) {
            return Err(ConversionError::TypeMismatch {
                declared: source,
                actual: value.type_key().clone(),
            });
        }

        let mut tags = request.variations_have.clone();
        let mut revealed = TagSet::new();
        if request.detect {
            let revealers = self.registry.read().revealers.revealers_for(&source);
            revealed = run_revealers(&source, &revealers, &value)?;
            for tag in revealed.iter() {
                tags.insert(tag.clone());
            }
        }

        let search = SearchRequest::new(
            VariationKey::start_keys(&source, &tags),
            request.type_want.clone(),
            request.variations_want.clone(),
            request.explicit,
        );
        if let Some(trace) = trace.as_deref_mut() {
            trace.start_keys = search.start_keys.clone();
            trace.revealed = revealed;
        }
        tracing::debug!(
            from = %VariationKey::new(source.clone(), tags),
            to = %request.type_want,
            explicit = request.explicit,
            "convert"
        );

        let outcome = Executor::new(&self.policy, request.debug).run(
            &value,
            &search,
            |excluded| {
                let registry = self.registry.read();
                PathSearch::new(&registry.edges, &self.policy).find_path(&search, excluded)
            },
            trace,
        )?;

        Ok(match outcome {
            Outcome::Identity => value.relabel(request.type_want.clone()),
            Outcome::Converted(converted) => converted,
        })
    }
}

impl Default for Conversions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::ParseIntError;

    const NONE: [&str; 0] = [];

    #[test]
    fn test_typed_round_trip() {
        let conv = Conversions::new();
        conv.add_typed_conversion(1, NONE, NONE, |s: &String| s.parse::<i64>())
            .unwrap();

        let n: i64 = conv.convert_to(Value::new(String::from("123"))).unwrap();
        assert_eq!(n, 123);
    }

    #[test]
    fn test_identity_shortcut() {
        let conv = Conversions::new();
        let v = conv
            .convert(Value::new(7i64), &ConvertRequest::to::<i64>())
            .unwrap();
        assert_eq!(v.downcast::<i64>().unwrap(), 7);
    }

    #[test]
    fn test_explicit_suppresses_identity() {
        let conv = Conversions::new();
        let err = conv
            .convert(Value::new(7i64), &ConvertRequest::to::<i64>().explicit(true))
            .unwrap_err();
        assert!(err.is_no_path());

        conv.add_typed_conversion(1, NONE, NONE, |n: &i64| Ok::<_, BoxError>(n * 2))
            .unwrap();
        let v = conv
            .convert(Value::new(7i64), &ConvertRequest::to::<i64>().explicit(true))
            .unwrap();
        assert_eq!(v.downcast::<i64>().unwrap(), 14);
    }

    #[test]
    fn test_type_have_mismatch() {
        let conv = Conversions::new();
        let err = conv
            .convert(
                Value::new(String::from("x")),
                &ConvertRequest::to::<String>().have(TypeKey::of::<i64>()),
            )
            .unwrap_err();
        assert!(matches!(err, ConversionError::TypeMismatch { .. }));
    }

    #[test]
    fn test_negative_cost() {
        let conv = Conversions::new();
        let err = conv
            .add_typed_conversion(-3, NONE, NONE, |s: &String| s.parse::<i64>())
            .unwrap_err();
        assert_eq!(err, RegistrationError::NegativeCost(-3));
        assert_eq!(conv.num_edges(), 0);
    }

    #[test]
    fn test_typed_revealer_routes_by_tag() {
        let conv = Conversions::new();
        conv.add_typed_revealer(|s: &String| {
            if s.starts_with("0x") { vec!["hex"] } else { vec![] }
        });
        conv.add_typed_conversion(2, NONE, NONE, |s: &String| s.parse::<i64>())
            .unwrap();
        conv.add_typed_conversion(1, ["hex"], NONE, |s: &String| {
            i64::from_str_radix(s.trim_start_matches("0x"), 16)
        })
        .unwrap();

        let hex: i64 = conv.convert_to(Value::new(String::from("0x1f"))).unwrap();
        let dec: i64 = conv.convert_to(Value::new(String::from("31"))).unwrap();
        assert_eq!(hex, 31);
        assert_eq!(dec, 31);
    }

    #[test]
    fn test_detect_off_skips_revealers() {
        let conv = Conversions::new();
        conv.add_typed_revealer(|_: &String| vec!["marked"]);
        conv.add_typed_conversion(1, ["marked"], NONE, |s: &String| Ok::<_, ParseIntError>(s.len() as i64))
            .unwrap();

        let request = ConvertRequest::to::<i64>();
        assert!(conv.convert(Value::new(String::from("abc")), &request).is_ok());
        assert!(conv
            .convert(Value::new(String::from("abc")), &request.clone().detect(false))
            .unwrap_err()
            .is_no_path());
        assert!(conv
            .convert(
                Value::new(String::from("abc")),
                &request.detect(false).have_tags(["marked"]),
            )
            .is_ok());
    }

    #[test]
    fn test_revealer_fault_propagates() {
        let conv = Conversions::new();
        conv.add_revealer(TypeKey::of::<String>(), |_: &Value| -> Result<Vec<Tag>, BoxError> {
            Err("inspection failed".into())
        });
        let err = conv
            .convert(Value::new(String::from("x")), &ConvertRequest::to::<i64>())
            .unwrap_err();
        assert!(matches!(err, ConversionError::Revealer(_)));
    }

    #[test]
    fn test_nested_convert_from_conversion() {
        let conv = Arc::new(Conversions::new());
        conv.add_typed_conversion(1, NONE, NONE, |s: &String| s.parse::<i64>())
            .unwrap();

        let inner = Arc::downgrade(&conv);
        conv.add_conversion(
            1,
            TypeKey::of::<Vec<String>>(),
            NONE,
            TypeKey::of::<Vec<i64>>(),
            NONE,
            move |value: &Value| -> Result<Value, BoxError> {
                let conv = inner.upgrade().ok_or("registry dropped")?;
                let items = value.downcast_ref::<Vec<String>>().ok_or("not a list")?;
                let mut out = Vec::new();
                for item in items {
                    out.push(conv.convert_to::<i64>(Value::new(item.clone()))?);
                }
                Ok(Value::new(out))
            },
        )
        .unwrap();

        let list = vec![String::from("1"), String::from("2")];
        let out: Vec<i64> = conv.convert_to(Value::new(list)).unwrap();
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn test_traced_records_attempts() {
        let conv = Conversions::new();
        conv.add_typed_conversion(1, NONE, NONE, |s: &String| s.parse::<i64>())
            .unwrap();
        conv.add_typed_conversion(5, NONE, NONE, |s: &String| Ok::<_, BoxError>(s.len() as i64))
            .unwrap();

        let (result, trace) = conv.convert_traced(
            Value::new(String::from("abc")),
            &ConvertRequest::to::<i64>().debug(true),
        );
        assert_eq!(result.unwrap().downcast::<i64>().unwrap(), 3);
        assert_eq!(trace.attempts.len(), 2);
        assert_eq!(trace.succeeded().unwrap().cost, 5);
        assert_eq!(trace.registry_fingerprint, conv.fingerprint());
        assert_eq!(trace.policy_id, crate::DEFAULT_POLICY_VERSION);
        assert_eq!(trace.policy_hash, conv.policy().params_hash());
        assert!(trace.to_json().contains("\"status\": \"failed\""));
    }
}
