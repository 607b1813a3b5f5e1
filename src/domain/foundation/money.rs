//! Monetary amount value object.
//!
//! All money in this service is integer minor currency units (VND has no
//! subunit, so one unit is one dong). Floating point never touches a balance.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A strictly positive monetary amount in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Creates an amount, rejecting zero and negative values.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value <= 0 {
            return Err(ValidationError::non_positive_amount("amount", value));
        }
        Ok(Self(value))
    }

    /// Returns the raw value in minor units.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn amount_accepts_positive_values() {
        let amount = Amount::new(50_000).unwrap();
        assert_eq!(amount.value(), 50_000);
    }

    #[test]
    fn amount_rejects_zero() {
        assert!(Amount::new(0).is_err());
    }

    #[test]
    fn amount_rejects_negative() {
        assert!(Amount::new(-1).is_err());
    }

    #[test]
    fn amount_serializes_as_bare_number() {
        let amount = Amount::new(75_000).unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "75000");
    }

    proptest! {
        #[test]
        fn amount_construction_matches_sign(value in any::<i64>()) {
            let result = Amount::new(value);
            prop_assert_eq!(result.is_ok(), value > 0);
        }
    }
}
