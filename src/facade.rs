//! Process-wide default registry with the built-in casts.
//!
//! Library code should construct its own [`Conversions`]; this module exists
//! for quick scripts and the CLI.
//!
//! ```rust
//! use conversion_graph::facade::to;
//!
//! assert_eq!(to::<i64>("123").unwrap(), 123);
//! assert_eq!(to::<String>(123i64).unwrap(), "123");
//! ```

use std::any::Any;
use std::sync::OnceLock;

use crate::builtins::register_builtins;
use crate::conversions::Conversions;
use crate::types::{BoxError, ConversionError, EdgeId, RegistrationError, Tag, Value};

static DEFAULT: OnceLock<Conversions> = OnceLock::new();

/// The shared default registry, built on first use.
pub fn default_conversions() -> &'static Conversions {
    DEFAULT.get_or_init(|| {
        let conversions = Conversions::new();
        if let Err(e) = register_builtins(&conversions) {
            tracing::error!(error = %e, "failed to register builtin conversions");
        }
        conversions
    })
}

/// Convert `value` to `T` using the default registry.
pub fn to<T: Any>(value: impl Any + Send) -> Result<T, ConversionError> {
    default_conversions().convert_to::<T>(Value::new(value))
}

/// Register a typed conversion on the default registry.
pub fn add_conversion<A, B, E, F>(function: F, cost: i64) -> Result<EdgeId, RegistrationError>
where
    A: Any,
    B: Any + Send,
    E: Into<BoxError>,
    F: Fn(&A) -> Result<B, E> + Send + Sync + 'static,
{
    default_conversions().add_typed_conversion(cost, [] as [Tag; 0], [] as [Tag; 0], function)
}
