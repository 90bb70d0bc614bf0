//! Amounts as written in TOML files.
//!
//! TOML integers are 64-bit, but token amounts are 128-bit base units. A
//! config amount is either:
//! - an integer: taken as base units (`amount = 100`)
//! - a string: a decimal amount of whole tokens, scaled by the token's
//!   decimals (`amount = "100.5"`)

use serde::{Deserialize, Serialize};
use sprint_core::domain::Amount;
use sprint_core::token::{parse_units, UnitsError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountSpec {
    Base(u64),
    Tokens(String),
}

impl AmountSpec {
    /// Resolve to base units for a token with `decimals` decimal places.
    pub fn resolve(&self, decimals: u8) -> Result<Amount, UnitsError> {
        match self {
            AmountSpec::Base(units) => Ok(*units as Amount),
            AmountSpec::Tokens(text) => parse_units(text, decimals),
        }
    }
}

impl From<u64> for AmountSpec {
    fn from(units: u64) -> Self {
        AmountSpec::Base(units)
    }
}

impl From<&str> for AmountSpec {
    fn from(tokens: &str) -> Self {
        AmountSpec::Tokens(tokens.to_string())
    }
}

impl fmt::Display for AmountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountSpec::Base(units) => write!(f, "{units}"),
            AmountSpec::Tokens(text) => write!(f, "\"{text}\""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        amount: AmountSpec,
    }

    #[test]
    fn integers_are_base_units() {
        let h: Holder = toml::from_str("amount = 250").unwrap();
        assert_eq!(h.amount, AmountSpec::Base(250));
        assert_eq!(h.amount.resolve(18), Ok(250));
    }

    #[test]
    fn strings_are_token_amounts() {
        let h: Holder = toml::from_str("amount = \"100.5\"").unwrap();
        assert_eq!(h.amount.resolve(6), Ok(100_500_000));
        assert_eq!(
            h.amount.resolve(18),
            Ok(100_500_000_000_000_000_000)
        );
    }

    #[test]
    fn bad_strings_surface_units_error() {
        assert!(AmountSpec::from("ten").resolve(6).is_err());
    }
}
