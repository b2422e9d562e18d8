//! EAN / GTIN barcode value object.

use serde::{Deserialize, Serialize};

use stockroom_core::ValueObject;

/// Barcode of a variant (the catalog's business key).
///
/// Stored as entered, minus surrounding whitespace. Uniqueness across variants
/// is *intended* but not enforced by the store, which is why duplicate
/// detection exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Ean(String);

impl ValueObject for Ean {}

impl Ean {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    /// GTIN-8, GTIN-12 (UPC-A), GTIN-13 (EAN-13) or GTIN-14: all digits, known length.
    pub fn is_gtin_shape(&self) -> bool {
        matches!(self.0.len(), 8 | 12 | 13 | 14) && self.0.bytes().all(|b| b.is_ascii_digit())
    }

    /// Validate the trailing GS1 check digit.
    pub fn has_valid_check_digit(&self) -> bool {
        if !self.is_gtin_shape() {
            return false;
        }

        let digits: Vec<u32> = self.0.bytes().map(|b| u32::from(b - b'0')).collect();
        let (payload, check) = digits.split_at(digits.len() - 1);

        // Weights alternate 3,1,3,... starting from the digit next to the check digit.
        let sum: u32 = payload
            .iter()
            .rev()
            .enumerate()
            .map(|(i, d)| if i % 2 == 0 { d * 3 } else { *d })
            .sum();

        (10 - sum % 10) % 10 == check[0]
    }
}

impl From<String> for Ean {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Ean {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<Ean> for String {
    fn from(value: Ean) -> Self {
        value.0
    }
}

impl core::fmt::Display for Ean {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(Ean::new("  7501234567890\n").as_str(), "7501234567890");
        assert!(Ean::new("   ").is_blank());
    }

    #[test]
    fn validates_gs1_check_digits() {
        assert!(Ean::new("4006381333931").has_valid_check_digit());
        assert!(Ean::new("73513537").has_valid_check_digit());
        assert!(!Ean::new("4006381333932").has_valid_check_digit());
        assert!(!Ean::new("7501234567890").has_valid_check_digit());
    }

    #[test]
    fn non_numeric_codes_are_not_gtins() {
        let ean = Ean::new("ABC-123");
        assert!(!ean.is_gtin_shape());
        assert!(!ean.has_valid_check_digit());
    }

    #[test]
    fn deserializes_with_normalization() {
        let ean: Ean = serde_json::from_str("\" 73513537 \"").unwrap();
        assert_eq!(ean, Ean::new("73513537"));
    }
}
