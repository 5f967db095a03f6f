//! Rich leaf values.
//!
//! A rich value is object-like but opaque to the diff engine: it is never
//! descended into, and two rich values are compared through their numeric or
//! string forms instead of structurally. The set of kinds is closed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A leaf value with boxed-object semantics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rich {
    /// A point in time, in milliseconds since the UNIX epoch.
    Date { ms: i64 },
    /// A regular expression literal.
    Regex { source: String, flags: String },
    /// A boxed string.
    Str { value: String },
    /// A boxed number.
    Num { value: f64 },
}

impl Rich {
    /// Create a date leaf from epoch milliseconds.
    pub fn date(ms: i64) -> Self {
        Rich::Date { ms }
    }

    /// Create a regex leaf.
    pub fn regex(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Rich::Regex {
            source: source.into(),
            flags: flags.into(),
        }
    }

    /// Create a boxed string leaf.
    pub fn string(value: impl Into<String>) -> Self {
        Rich::Str {
            value: value.into(),
        }
    }

    /// Create a boxed number leaf.
    pub fn number(value: f64) -> Self {
        Rich::Num { value }
    }

    /// Short name of the leaf kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Rich::Date { .. } => "date",
            Rich::Regex { .. } => "regex",
            Rich::Str { .. } => "string-wrapper",
            Rich::Num { .. } => "number-wrapper",
        }
    }

    /// Numeric coercion. `NaN` when the value has no numeric reading.
    pub fn to_number(&self) -> f64 {
        match self {
            Rich::Date { ms } => *ms as f64,
            Rich::Regex { .. } => f64::NAN,
            Rich::Str { value } => string_to_number(value),
            Rich::Num { value } => *value,
        }
    }

    /// String coercion.
    ///
    /// Dates render as their epoch milliseconds.
    pub fn to_display(&self) -> String {
        match self {
            Rich::Date { ms } => ms.to_string(),
            Rich::Regex { source, flags } => format!("/{source}/{flags}"),
            Rich::Str { value } => value.clone(),
            Rich::Num { value } => number_to_string(*value),
        }
    }
}

impl fmt::Display for Rich {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display())
    }
}

/// Numeric reading of a string with script-engine rules: surrounding
/// whitespace is ignored, the empty string is zero, `Infinity` is accepted
/// and radix prefixes are honored.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN);
        }
    }
    // Rust accepts spellings like "inf" and "nan" that are not numbers here.
    let lower = trimmed.to_ascii_lowercase();
    if lower.contains("inf") || lower.contains("nan") {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// String form of a number with script-engine rules (`1` not `1.0`).
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == n.trunc() && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_coerces_to_epoch_ms() {
        assert_eq!(Rich::date(1_700_000_000_000).to_number(), 1_700_000_000_000.0);
    }

    #[test]
    fn regex_is_not_numeric() {
        let re = Rich::regex("a+b", "gi");
        assert!(re.to_number().is_nan());
        assert_eq!(re.to_display(), "/a+b/gi");
    }

    #[test]
    fn boxed_string_numeric_reading() {
        assert_eq!(Rich::string(" 42 ").to_number(), 42.0);
        assert_eq!(Rich::string("").to_number(), 0.0);
        assert_eq!(Rich::string("0x10").to_number(), 16.0);
        assert!(Rich::string("abc").to_number().is_nan());
        assert!(Rich::string("inf").to_number().is_nan());
        assert_eq!(Rich::string("-Infinity").to_number(), f64::NEG_INFINITY);
    }

    #[test]
    fn number_display_drops_trailing_fraction() {
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(-2.5), "-2.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(Rich::number(3.0).to_display(), "3");
    }

    #[test]
    fn kind_names() {
        assert_eq!(Rich::date(0).kind_name(), "date");
        assert_eq!(Rich::string("x").kind_name(), "string-wrapper");
    }
}
