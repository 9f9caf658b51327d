//! Canonical serialization for registry and policy fingerprints.
//!
//! Fingerprints let callers tell whether two registries (or two policies)
//! have the same shape without comparing them field by field.
//!
//! ## Determinism Guarantees
//!
//! - Struct fields serialize in declaration order
//! - Edge lists serialize in registration order
//! - Tag sets are `BTreeSet`-backed and serialize sorted

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
///
/// Only used with plain data types whose serialization cannot fail; a failure
/// hashes the empty byte string.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}
