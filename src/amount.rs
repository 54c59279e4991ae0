//! Protect before using non positive or over precise amount for deposits and transfers.

use std::{borrow::Borrow, ops::Deref};

use rust_decimal::Decimal;
use thiserror::Error;

/// Number of fractional digits of the smallest currency unit
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Represent positive financial amount of money with at most [`MINOR_UNIT_SCALE`] fractional
/// digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(Decimal);

/// represent error when operation want to use improper amount of money
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountErr {
    /// amount is zero or negative
    #[error("amount must be greater than zero")]
    NotPositive,
    /// amount has more fractional digits than the minor unit allows
    #[error("amount has more than {MINOR_UNIT_SCALE} decimal places")]
    TooPrecise,
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountErr;
    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value <= Decimal::ZERO {
            return Err(AmountErr::NotPositive);
        }
        let normalized = value.normalize();
        if normalized.scale() > MINOR_UNIT_SCALE {
            return Err(AmountErr::TooPrecise);
        }
        Ok(Self(normalized))
    }
}

impl From<Amount> for Decimal {
    fn from(this: Amount) -> Self {
        this.0
    }
}

impl Borrow<Decimal> for Amount {
    fn borrow(&self) -> &Decimal {
        &self.0
    }
}

impl Deref for Amount {
    type Target = Decimal;
    fn deref(&self) -> &Self::Target {
        self.borrow()
    }
}

/// Render a money value with exactly [`MINOR_UNIT_SCALE`] fractional digits
pub fn to_minor_scale(value: Decimal) -> Decimal {
    let mut value = value;
    value.rescale(MINOR_UNIT_SCALE);
    value
}

#[cfg(test)]
mod test {
    use super::{to_minor_scale, Amount, AmountErr};
    use rust_decimal::Decimal;

    #[test]
    fn rejects_zero_and_negative() {
        assert_eq!(Amount::try_from(Decimal::ZERO), Err(AmountErr::NotPositive));
        assert_eq!(
            Amount::try_from(Decimal::new(-1, 2)),
            Err(AmountErr::NotPositive)
        );
    }

    #[test]
    fn rejects_sub_minor_unit() {
        assert_eq!(
            Amount::try_from(Decimal::new(1005, 3)),
            Err(AmountErr::TooPrecise)
        );
        // trailing zeros do not count
        let a = Amount::try_from(Decimal::new(1500, 3)).unwrap();
        assert_eq!(*a, Decimal::new(15, 1));
    }

    #[test]
    fn minor_scale_rendering() {
        assert_eq!(to_minor_scale(Decimal::new(150, 0)).to_string(), "150.00");
        assert_eq!(to_minor_scale(Decimal::new(755, 1)).to_string(), "75.50");
    }

    #[test]
    fn max_precision_fraction_is_too_precise() {
        // 28 fractional digits, representable but below the minor unit
        let tiny = Decimal::from_i128_with_scale(1, 28);
        assert_eq!(Amount::try_from(tiny), Err(AmountErr::TooPrecise));
        let a = Amount::try_from(Decimal::new(125, 1)).unwrap();
        assert_eq!(Decimal::from(a), Decimal::new(125, 1));
    }
}
