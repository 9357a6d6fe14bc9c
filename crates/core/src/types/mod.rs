//! Shared type definitions and newtypes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount of "currency-days" (the wallet's 金米 balance).
///
/// The provider reports amounts as integer points where 100 points make one
/// day. The raw point value is kept so that conversion stays exact.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CurrencyDays(i64);

impl CurrencyDays {
    pub const ZERO: CurrencyDays = CurrencyDays(0);

    pub const fn from_points(points: i64) -> Self {
        CurrencyDays(points)
    }

    /// Raw provider value (hundredths of a day)
    pub fn points(&self) -> i64 {
        self.0
    }

    pub fn saturating_add(self, other: CurrencyDays) -> Self {
        CurrencyDays(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for CurrencyDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Shorten a secret for log output, keeping only a recognisable prefix
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(8).collect();
    if prefix.len() == secret.len() {
        "***".to_string()
    } else {
        format!("{}...", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_convert_exactly() {
        let days = CurrencyDays::from_points(3155);
        assert_eq!(days.to_string(), "31.55");
        assert_eq!(days.points(), 3155);
    }

    #[test]
    fn test_display_small_and_negative() {
        assert_eq!(CurrencyDays::from_points(5).to_string(), "0.05");
        assert_eq!(CurrencyDays::from_points(-250).to_string(), "-2.50");
        assert_eq!(CurrencyDays::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_ordering_follows_points() {
        assert!(CurrencyDays::from_points(3100) > CurrencyDays::from_points(3099));
    }

    #[test]
    fn test_redact_hides_short_secrets() {
        assert_eq!(redact("abc"), "***");
        assert_eq!(redact("V1:abcdefghijk"), "V1:abcde...");
    }
}
