//! Range-valued attributes
//!
//! Upstream pages write spreads as `"5"`, `"5-7"` or with a unit suffix such
//! as `"5-7%"` or `"1.5-2 mL"`. Parsing never enforces `min <= max`; callers
//! decide how to report inverted ranges.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A `(min, max)` pair, serialized as `{"min": .., "max": ..}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

/// Numeric spread such as an acid percentage or a temperature
pub type NumericRange = Range<f64>;

/// Textual spread such as an alpha/beta ratio (`"1:1"` to `"3:1"`)
pub type RatioRange = Range<String>;

/// Why a range value could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeParseError {
    #[error("empty value")]
    Empty,

    #[error("expected one or two values but found {count} in '{text}'")]
    TokenCount { count: usize, text: String },

    #[error("'{token}' is not a number")]
    NotNumeric { token: String },
}

impl<T> Range<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: Clone> Range<T> {
    /// Range where both bounds are `value`
    pub fn single(value: T) -> Self {
        Self {
            min: value.clone(),
            max: value,
        }
    }
}

impl<T: PartialOrd> Range<T> {
    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }
}

/// Split `text` into at most two trimmed tokens after dropping `unit`.
fn tokens<'a>(text: &'a str, unit: &str) -> Result<Vec<&'a str>, RangeParseError> {
    let trimmed = text.trim();
    let trimmed = if unit.is_empty() {
        trimmed
    } else {
        trimmed.strip_suffix(unit).unwrap_or(trimmed).trim()
    };

    if trimmed.is_empty() {
        return Err(RangeParseError::Empty);
    }

    let parts: Vec<&str> = trimmed.split('-').map(str::trim).collect();
    if parts.len() > 2 {
        return Err(RangeParseError::TokenCount {
            count: parts.len(),
            text: text.to_string(),
        });
    }
    Ok(parts)
}

impl NumericRange {
    /// Parse `"A"`, `"A-B"`, `"A<unit>"` or `"A-B<unit>"`.
    ///
    /// ```
    /// use brewdex_scrape::model::NumericRange;
    ///
    /// let range = NumericRange::parse("5-7%", "%").unwrap();
    /// assert_eq!((range.min, range.max), (5.0, 7.0));
    /// ```
    pub fn parse(text: &str, unit: &str) -> Result<Self, RangeParseError> {
        let parts = tokens(text, unit)?;
        let values = parts
            .iter()
            .map(|token| {
                token
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| RangeParseError::NotNumeric {
                        token: token.to_string(),
                    })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        match values.as_slice() {
            [value] => Ok(Range::single(*value)),
            [min, max] => Ok(Range::new(*min, *max)),
            _ => Err(RangeParseError::Empty),
        }
    }

    /// Apply `f` to both bounds
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Range::new(f(self.min), f(self.max))
    }
}

impl RatioRange {
    /// Parse `"1:1"` or `"1:1 - 3:1"` without interpreting the ratios
    pub fn parse(text: &str) -> Result<Self, RangeParseError> {
        let parts = tokens(text, "")?;
        if let Some(token) = parts.iter().find(|token| token.is_empty()) {
            return Err(RangeParseError::NotNumeric {
                token: token.to_string(),
            });
        }

        match parts.as_slice() {
            [value] => Ok(Range::single(value.to_string())),
            [min, max] => Ok(Range::new(min.to_string(), max.to_string())),
            _ => Err(RangeParseError::Empty),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair_with_unit() {
        let range = NumericRange::parse("5-7%", "%").unwrap();
        assert_eq!(range, Range::new(5.0, 7.0));
    }

    #[test]
    fn test_parse_single_value_with_unit() {
        let range = NumericRange::parse("5%", "%").unwrap();
        assert_eq!(range, Range::new(5.0, 5.0));
    }

    #[test]
    fn test_parse_spaced_unit() {
        let range = NumericRange::parse(" 1.5 - 2 mL ", "mL").unwrap();
        assert_eq!(range, Range::new(1.5, 2.0));
    }

    #[test]
    fn test_sentinel_word_is_rejected() {
        let err = NumericRange::parse("Unknown%", "%").unwrap_err();
        assert_eq!(
            err,
            RangeParseError::NotNumeric {
                token: "Unknown".to_string()
            }
        );
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        for (text, token) in [("NaN%", "NaN"), ("inf", "inf"), ("5-inf%", "inf"), ("1e999%", "1e999")] {
            assert_eq!(
                NumericRange::parse(text, "%"),
                Err(RangeParseError::NotNumeric {
                    token: token.to_string()
                }),
                "{text}"
            );
        }
    }

    #[test]
    fn test_too_many_tokens() {
        let err = NumericRange::parse("1-2-3%", "%").unwrap_err();
        assert!(matches!(err, RangeParseError::TokenCount { count: 3, .. }));
    }

    #[test]
    fn test_empty_value() {
        assert_eq!(NumericRange::parse("  %", "%"), Err(RangeParseError::Empty));
    }

    #[test]
    fn test_inverted_range_is_accepted() {
        let range = NumericRange::parse("9-4%", "%").unwrap();
        assert!(range.is_inverted());
        assert_eq!(range.min, 9.0);
    }

    #[test]
    fn test_ratio_range() {
        let range = RatioRange::parse("1:1 - 3:1").unwrap();
        assert_eq!(range, Range::new("1:1".to_string(), "3:1".to_string()));
        assert!(RatioRange::parse("1:1 -").is_err());
    }

    #[test]
    fn test_serializes_as_min_max() {
        let json = serde_json::to_value(Range::new(60.0, 72.0)).unwrap();
        assert_eq!(json, serde_json::json!({"min": 60.0, "max": 72.0}));
    }
}
