//! Built-in casts between `String`, `i64`, `f64` and `bool`.
//!
//! Every cast costs 1, so a failing direct cast (`"abc"` to `i64`) falls back
//! to a two-step route such as `String -> bool -> i64`. `&'static str` is
//! accepted as a zero-cost alias of `String`.
//!
//! | From \ To | String | i64 | f64 | bool |
//! |-----------|--------|-----|-----|------|
//! | String | - | trimmed parse | trimmed parse | non-empty |
//! | i64 | decimal | - | widen | non-zero |
//! | f64 | keeps `.0` | truncate (finite only) | - | non-zero |
//! | bool | `True`/`False` | 1/0 | 1.0/0.0 | - |

use std::convert::Infallible;

use crate::conversions::Conversions;
use crate::types::{BoxError, RegistrationError};

/// Cost of every built-in cast.
pub const BUILTIN_COST: i64 = 1;

const NONE: [&str; 0] = [];

/// Register the built-in casts on `conversions`.
pub fn register_builtins(conversions: &Conversions) -> Result<(), RegistrationError> {
    conversions.add_typed_conversion(0, NONE, NONE, |s: &&'static str| {
        Ok::<_, Infallible>(s.to_string())
    })?;

    // String -> *
    conversions.add_typed_conversion(BUILTIN_COST, NONE, NONE, |s: &String| {
        s.trim().parse::<i64>()
    })?;
    conversions.add_typed_conversion(BUILTIN_COST, NONE, NONE, |s: &String| {
        s.trim().parse::<f64>()
    })?;
    conversions.add_typed_conversion(BUILTIN_COST, NONE, NONE, |s: &String| {
        Ok::<_, Infallible>(!s.is_empty())
    })?;

    // i64 -> *
    conversions.add_typed_conversion(BUILTIN_COST, NONE, NONE, |n: &i64| {
        Ok::<_, Infallible>(n.to_string())
    })?;
    conversions.add_typed_conversion(BUILTIN_COST, NONE, NONE, |n: &i64| {
        Ok::<_, Infallible>(*n as f64)
    })?;
    conversions.add_typed_conversion(BUILTIN_COST, NONE, NONE, |n: &i64| {
        Ok::<_, Infallible>(*n != 0)
    })?;

    // f64 -> *
    conversions.add_typed_conversion(BUILTIN_COST, NONE, NONE, |x: &f64| {
        Ok::<_, Infallible>(format!("{:?}", x))
    })?;
    conversions.add_typed_conversion(BUILTIN_COST, NONE, NONE, float_to_int)?;
    conversions.add_typed_conversion(BUILTIN_COST, NONE, NONE, |x: &f64| {
        Ok::<_, Infallible>(*x != 0.0)
    })?;

    // bool -> *
    conversions.add_typed_conversion(BUILTIN_COST, NONE, NONE, |b: &bool| {
        Ok::<_, Infallible>(if *b { "True" } else { "False" }.to_string())
    })?;
    conversions.add_typed_conversion(BUILTIN_COST, NONE, NONE, |b: &bool| {
        Ok::<_, Infallible>(i64::from(*b))
    })?;
    conversions.add_typed_conversion(BUILTIN_COST, NONE, NONE, |b: &bool| {
        Ok::<_, Infallible>(if *b { 1.0 } else { 0.0 })
    })?;

    tracing::debug!(edges = conversions.num_edges(), "builtin conversions registered");
    Ok(())
}

fn float_to_int(x: &f64) -> Result<i64, BoxError> {
    if !x.is_finite() {
        return Err(format!("cannot convert float {:?} to integer", x).into());
    }
    let truncated = x.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(format!("float {:?} is out of integer range", x).into());
    }
    Ok(truncated as i64)
}
