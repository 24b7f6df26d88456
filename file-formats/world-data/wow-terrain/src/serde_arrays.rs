//! Serializers for fixed arrays longer than serde's built-in 32 elements.

use serde::Serializer;
use serde::ser::Serialize;

/// Serialize any fixed array as a sequence.
pub fn serialize<S, T, const N: usize>(values: &[T; N], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    serializer.collect_seq(values.iter())
}

/// Serialize an optional boxed fixed array as an optional sequence.
pub fn serialize_boxed_option<S, T, const N: usize>(
    values: &Option<Box<[T; N]>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    match values {
        Some(values) => serializer.collect_seq(values.iter()),
        None => serializer.serialize_none(),
    }
}

/// Serialize an optional fixed array as an optional sequence.
pub fn serialize_option<S, T, const N: usize>(
    values: &Option<[T; N]>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    match values {
        Some(values) => serializer.collect_seq(values.iter()),
        None => serializer.serialize_none(),
    }
}
