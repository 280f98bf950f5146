//! Locale-aware decimal parsing for cell values.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};

/// Separators used when reading a cell as a number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberLocale {
    /// Character between the integer and fractional part
    pub decimal_separator: char,
    /// Optional digit-group character accepted in the integer part
    pub grouping_separator: Option<char>,
}

impl Default for NumberLocale {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            grouping_separator: Some(','),
        }
    }
}

impl NumberLocale {
    /// Create a locale with the given separators
    pub fn new(decimal_separator: char, grouping_separator: Option<char>) -> Self {
        Self {
            decimal_separator,
            grouping_separator,
        }
    }

    /// Parse the longest numeric prefix of `text`.
    ///
    /// Surrounding whitespace is ignored. Reading stops at the first
    /// character that cannot continue the number, so `"12abc"` is 12 and
    /// `"1e5"` is 1. Grouping characters count only between digits of the
    /// integer part. Fails when no digit is read.
    pub fn parse(&self, text: &str) -> Result<f64> {
        let invalid = || StoreError::NumberFormat(text.to_string());
        let trimmed = text.trim();

        let (negative, body) = match trimmed.chars().next() {
            Some('-') => (true, &trimmed[1..]),
            Some('+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let mut normalized = String::with_capacity(body.len() + 1);
        if negative {
            normalized.push('-');
        }

        let mut digits = 0usize;
        let mut in_fraction = false;
        let mut chars = body.chars().peekable();
        while let Some(c) = chars.next() {
            let digit_follows = chars.peek().is_some_and(|next| next.is_ascii_digit());
            if c.is_ascii_digit() {
                normalized.push(c);
                digits += 1;
            } else if c == self.decimal_separator && !in_fraction {
                in_fraction = true;
                normalized.push('.');
            } else if Some(c) == self.grouping_separator
                && !in_fraction
                && digits > 0
                && digit_follows
            {
                continue;
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(invalid());
        }
        normalized.parse::<f64>().map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_locale() {
        let locale = NumberLocale::default();
        assert_eq!(locale.parse("17.4").unwrap(), 17.4);
        assert_eq!(locale.parse("-19").unwrap(), -19.0);
        assert_eq!(locale.parse(" 1,234.5 ").unwrap(), 1234.5);
        assert_eq!(locale.parse(".5").unwrap(), 0.5);
        assert_eq!(locale.parse("+3").unwrap(), 3.0);
    }

    #[test]
    fn test_numeric_prefix() {
        let locale = NumberLocale::default();
        assert_eq!(locale.parse("12abc").unwrap(), 12.0);
        assert_eq!(locale.parse("1e5").unwrap(), 1.0);
        assert_eq!(locale.parse("1.2.3").unwrap(), 1.2);
        assert_eq!(locale.parse("12,").unwrap(), 12.0);
        assert_eq!(locale.parse("1,.5").unwrap(), 1.0);
        assert_eq!(locale.parse("-7 kg").unwrap(), -7.0);
    }

    #[test]
    fn test_rejects_non_numeric() {
        let locale = NumberLocale::default();
        for text in ["", "Cucumber", "-", "+", ".", ",12", "abc12", "-.x"] {
            assert!(
                matches!(locale.parse(text), Err(StoreError::NumberFormat(_))),
                "{:?} should not parse",
                text
            );
        }
    }

    #[test]
    fn test_comma_decimal_locale() {
        let locale = NumberLocale::new(',', Some('.'));
        assert_eq!(locale.parse("1.234,5").unwrap(), 1234.5);
        assert_eq!(locale.parse("0,25").unwrap(), 0.25);
        assert_eq!(locale.parse("0,2,5").unwrap(), 0.2);
        assert!(locale.parse(".5").is_err());
    }
}
