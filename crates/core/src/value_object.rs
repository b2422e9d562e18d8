//! Value object trait: equality by value, not identity.
//!
//! Value objects (an EAN, a parsed package volume) have **no identity**; two
//! value objects with the same attributes are equal. Entities (base products,
//! variants) are the opposite: see [`crate::Entity`].

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by value. To "modify" one, build a
/// new one. The bounds keep them cheap to copy around, comparable, and
/// printable in logs.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
