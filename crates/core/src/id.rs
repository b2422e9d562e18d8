//! Strongly-typed document identifiers used across the catalog.
//!
//! Identifiers are opaque strings assigned by the document store. The only
//! thing the domain checks is their *shape*: non-empty, bounded length, and a
//! conservative character set. Whether an id resolves to a document is a
//! separate (store-side) question.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Upper bound on identifier length accepted by the catalog.
pub const MAX_ID_LEN: usize = 128;

/// Identifier of a base product document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BaseProductId(String);

/// Identifier of a variant document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariantId(String);

fn check_shape(name: &'static str, raw: &str) -> Result<(), DomainError> {
    if raw.is_empty() {
        return Err(DomainError::invalid_id(name, "empty"));
    }
    if raw.len() > MAX_ID_LEN {
        return Err(DomainError::invalid_id(
            name,
            format!("longer than {MAX_ID_LEN} characters"),
        ));
    }
    if let Some(c) = raw
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')))
    {
        return Err(DomainError::invalid_id(
            name,
            format!("unexpected character {c:?}"),
        ));
    }
    Ok(())
}

macro_rules! impl_document_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Parse and shape-check an identifier.
            pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
                let raw = raw.into();
                check_shape($name, &raw)?;
                Ok(Self(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

impl_document_id!(BaseProductId, "base product id");
impl_document_id!(VariantId, "variant id");
