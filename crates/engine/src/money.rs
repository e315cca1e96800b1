use std::{fmt, str::FromStr};

use crate::{EngineError, ResultEngine};

/// Largest number of fraction digits a currency may declare.
///
/// `10^MAX_MINOR_UNITS` must fit in an `i64`.
pub const MAX_MINOR_UNITS: u8 = 8;

/// Signed money amount represented as integer **minor units** together with
/// the number of fraction digits used by its currency.
///
/// The engine stores and compares only the integer value; the scale is used
/// when converting from and to human input/output.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34, 2);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects
/// more decimals than the currency allows):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!(Money::parse("10", 2).unwrap().minor(), 1000);
/// assert_eq!(Money::parse("10,5", 2).unwrap().minor(), 1050);
/// assert!(Money::parse("12.345", 2).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Money {
    minor: i64,
    scale: u8,
}

impl Money {
    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64, scale: u8) -> Self {
        Self { minor, scale }
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.minor
    }

    /// Returns the number of fraction digits.
    #[must_use]
    pub const fn scale(self) -> u8 {
        self.scale
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.minor > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.minor < 0
    }

    /// Parses a decimal string into minor units of a currency with `scale`
    /// fraction digits.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    pub fn parse(input: &str, scale: u8) -> ResultEngine<Self> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        if scale > MAX_MINOR_UNITS {
            return Err(EngineError::InvalidAmount(format!(
                "unsupported minor units: {scale}"
            )));
        }

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.trim().replace(',', ".");
        if rest.is_empty() {
            return Err(empty());
        }

        let mut parts = rest.split('.');
        let major_str = parts.next().ok_or_else(invalid)?;
        let fraction_str = parts.next().unwrap_or("");
        if parts.next().is_some() {
            return Err(invalid());
        }

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !fraction_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction_str.len() > usize::from(scale) {
            return Err(EngineError::InvalidAmount("too many decimals".to_string()));
        }

        let factor = 10i64.pow(u32::from(scale));
        let major: i64 = major_str.parse().map_err(|_| overflow())?;
        let fraction: i64 = if fraction_str.is_empty() {
            0
        } else {
            // Right-pad so "10.5" with scale 2 becomes 50 minor units.
            let padding = u32::from(scale) - fraction_str.len() as u32;
            fraction_str.parse::<i64>().map_err(|_| invalid())? * 10i64.pow(padding)
        };

        let total = major
            .checked_mul(factor)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(overflow)?;
        let minor = if negative { -total } else { total };

        Ok(Self { minor, scale })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        if self.scale == 0 {
            return write!(f, "{sign}{abs}");
        }
        let factor = 10u64.pow(u32::from(self.scale));
        let width = usize::from(self.scale);
        write!(f, "{sign}{}.{:0width$}", abs / factor, abs % factor)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses with two fraction digits, the default for new currencies.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_pads_fraction() {
        assert_eq!(Money::new(0, 2).to_string(), "0.00");
        assert_eq!(Money::new(1, 2).to_string(), "0.01");
        assert_eq!(Money::new(1050, 2).to_string(), "10.50");
        assert_eq!(Money::new(-1050, 2).to_string(), "-10.50");
        assert_eq!(Money::new(7, 0).to_string(), "7");
        assert_eq!(Money::new(1_000, 3).to_string(), "1.000");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!(Money::parse("10", 2).unwrap().minor(), 1000);
        assert_eq!(Money::parse("10.5", 2).unwrap().minor(), 1050);
        assert_eq!(Money::parse("10,50", 2).unwrap().minor(), 1050);
        assert_eq!(Money::parse("-0.01", 2).unwrap().minor(), -1);
        assert_eq!(Money::parse("+1.00", 2).unwrap().minor(), 100);
        assert_eq!(Money::parse("  2.30 ", 2).unwrap().minor(), 230);
        assert_eq!(Money::parse("3.", 2).unwrap().minor(), 300);
    }

    #[test]
    fn parse_respects_scale() {
        assert_eq!(Money::parse("1.5", 3).unwrap().minor(), 1500);
        assert_eq!(Money::parse("42", 0).unwrap().minor(), 42);
        assert!(Money::parse("4.2", 0).is_err());
        assert!(Money::parse("12.345", 2).is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Money::parse("", 2).is_err());
        assert!(Money::parse("-", 2).is_err());
        assert!(Money::parse("1.2.3", 2).is_err());
        assert!(Money::parse("abc", 2).is_err());
        assert!(Money::parse(".50", 2).is_err());
        assert!(Money::parse("99999999999999999999", 2).is_err());
    }
}
