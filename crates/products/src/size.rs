//! Package size parsing.
//!
//! Variant sizes are free text typed at product entry ("1.5 L", "355ml",
//! "6 x 355 ml", "1,5 lt", "500 gr"). The catalog keeps the text as-is and
//! derives `parsedVolume` + `unit` from it so variants can be compared.

use serde::{Deserialize, Deserializer, Serialize};

use stockroom_core::ValueObject;

/// Measurement unit recognized in size text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "ml")]
    Milliliter,
    #[serde(rename = "l")]
    Liter,
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "oz")]
    FluidOunce,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Milliliter => "ml",
            Unit::Liter => "l",
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::FluidOunce => "oz",
        }
    }

    /// Map a unit token (already lowercased) to a unit.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ml" | "mls" | "cc" | "mililitro" | "mililitros" => Some(Unit::Milliliter),
            "l" | "lt" | "lts" | "ltr" | "litro" | "litros" => Some(Unit::Liter),
            "g" | "gr" | "grs" | "gramo" | "gramos" => Some(Unit::Gram),
            "kg" | "kgs" | "kilo" | "kilos" => Some(Unit::Kilogram),
            "oz" | "floz" => Some(Unit::FluidOunce),
            _ => None,
        }
    }
}

impl core::fmt::Display for Unit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed package amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub amount: f64,
    pub unit: Unit,
}

impl ValueObject for Volume {}

/// Parse the first `<number><unit>` pair out of a size text.
///
/// Accepts `,` as decimal separator and optional whitespace between number
/// and unit. Multipack prefixes ("6 x 355 ml") are skipped because `x` is not
/// a unit. Returns `None` when nothing recognizable is found.
pub fn parse_size(text: &str) -> Option<Volume> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let (number, after_number) = scan_number(&chars, i);
        let (mut token, j) = scan_word(&chars, skip_spaces(&chars, after_number));

        // "fl oz" is written with a space.
        if token == "fl" {
            let (next, _) = scan_word(&chars, skip_spaces(&chars, j));
            if next == "oz" {
                token = "floz".to_string();
            }
        }

        if let (Some(unit), Ok(amount)) = (Unit::from_token(&token), number.parse::<f64>()) {
            if amount > 0.0 {
                return Some(Volume { amount, unit });
            }
        }

        i = after_number;
    }

    None
}

fn scan_number(chars: &[char], start: usize) -> (String, usize) {
    let mut out = String::new();
    let mut seen_separator = false;
    let mut i = start;

    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() {
            out.push(c);
        } else if (c == '.' || c == ',')
            && !seen_separator
            && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())
        {
            seen_separator = true;
            out.push('.');
        } else {
            break;
        }
        i += 1;
    }

    (out, i)
}

fn scan_word(chars: &[char], start: usize) -> (String, usize) {
    let mut i = start;
    let mut out = String::new();
    while i < chars.len() && chars[i].is_alphabetic() {
        out.push(chars[i]);
        i += 1;
    }
    (out, i)
}

fn skip_spaces(chars: &[char], start: usize) -> usize {
    let mut i = start;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    i
}

/// Serde helper: unknown or malformed stored units decode as `None`
/// instead of failing the whole document.
pub(crate) fn lenient_unit<'de, D>(deserializer: D) -> Result<Option<Unit>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| Unit::from_token(&s.trim().to_lowercase())))
}
